use std::collections::HashSet;

use indexmap::IndexMap;
use log::{info, warn};

use crate::Module;

#[derive(Debug)]
pub enum TopModuleError {
    Empty,
    NotFound { name: String, available: Vec<String> },
}

impl std::fmt::Display for TopModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopModuleError::Empty => write!(f, "no modules found in design"),
            TopModuleError::NotFound { name, available } => {
                write!(f, "top module {:?} not found; available modules: {:?}", name, available)
            }
        }
    }
}

impl std::error::Error for TopModuleError {}

/// A synthesized design: all of its modules, keyed by name, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Design {
    pub modules: IndexMap<String, Module>,
}

impl Design {
    pub fn new() -> Design {
        Design::default()
    }

    pub fn add_module(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    /// Resolves the top module, by name if given, structurally otherwise.
    ///
    /// An explicit name matches exactly, or with a single leading `\` escape
    /// marker added or stripped. Without a name, a lone module wins; with
    /// several, any module never referenced as another module's cell type is
    /// top, and failing that the first module in iteration order is used with
    /// a warning.
    pub fn top_module(&self, name: Option<&str>) -> Result<&Module, TopModuleError> {
        if self.modules.is_empty() {
            return Err(TopModuleError::Empty);
        }
        if let Some(name) = name {
            if let Some(module) = self.modules.get(name) {
                info!("using specified top module: {}", name);
                return Ok(module);
            }
            let escaped = format!("\\{name}");
            if let Some(module) = self.modules.get(&escaped) {
                info!("using specified top module (escaped): {}", escaped);
                return Ok(module);
            }
            if let Some(stripped) = name.strip_prefix('\\') {
                if let Some(module) = self.modules.get(stripped) {
                    info!("using specified top module: {}", stripped);
                    return Ok(module);
                }
            }
            for (module_name, module) in &self.modules {
                if module_name.strip_prefix('\\') == Some(name) {
                    info!("using specified top module: {}", module_name);
                    return Ok(module);
                }
            }
            let available =
                self.modules.keys().map(|n| n.strip_prefix('\\').unwrap_or(n).to_owned()).collect();
            return Err(TopModuleError::NotFound { name: name.to_owned(), available });
        }
        if self.modules.len() == 1 {
            let module = &self.modules[0];
            info!("auto-detected top module: {}", module.name.strip_prefix('\\').unwrap_or(&module.name));
            return Ok(module);
        }
        // A module instantiated by another module cannot be top. Cell types
        // may carry the escape marker or not; test both forms.
        let mut used = HashSet::new();
        for module in self.modules.values() {
            for cell in module.cells.values() {
                let type_name = cell.kind.type_name().into_owned();
                used.insert(type_name.strip_prefix('\\').unwrap_or(&type_name).to_owned());
                used.insert(type_name);
            }
        }
        for (module_name, module) in &self.modules {
            let clean = module_name.strip_prefix('\\').unwrap_or(module_name);
            if !used.contains(module_name) && !used.contains(clean) {
                info!("auto-detected top module: {}", clean);
                return Ok(module);
            }
        }
        let module = &self.modules[0];
        warn!(
            "multiple modules found; using first module as top: {}",
            module.name.strip_prefix('\\').unwrap_or(&module.name)
        );
        Ok(module)
    }
}
