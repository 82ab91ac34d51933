use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{info, warn};

#[derive(Debug)]
pub enum LibraryError {
    Io(PathBuf, std::io::Error),
    Json(PathBuf, jzon::Error),
    NoCells(PathBuf),
    NotFound,
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(path, error) => {
                write!(f, "cannot read cell library {}: {}", path.display(), error)
            }
            LibraryError::Json(path, error) => {
                write!(f, "cell library {} is not valid JSON: {}", path.display(), error)
            }
            LibraryError::NoCells(path) => {
                write!(f, "cell library {} contains no cells", path.display())
            }
            LibraryError::NotFound => {
                write!(f, "cell library not found; pass a metadata file or provide a default library")
            }
        }
    }
}

impl std::error::Error for LibraryError {}

/// Metadata of one library cell: its ordered pin list, the SPICE model or
/// subcircuit it instantiates, and the parameters it accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellMeta {
    pub pins: Vec<String>,
    pub spice_model: Option<String>,
    pub parameters: Vec<String>,
}

/// A loaded technology library. Read-only for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct CellLibrary {
    pub technology: String,
    pub cells: IndexMap<String, CellMeta>,
    /// SPICE file with the subcircuit bodies for the cells, if one exists.
    pub spice_file: Option<PathBuf>,
}

impl CellLibrary {
    pub fn contains(&self, cell_name: &str) -> bool {
        self.cells.contains_key(cell_name)
    }
}

fn parse_library(path: &Path, tech: Option<&str>) -> Result<CellLibrary, LibraryError> {
    let text = std::fs::read_to_string(path).map_err(|e| LibraryError::Io(path.to_owned(), e))?;
    let data = jzon::parse(&text).map_err(|e| LibraryError::Json(path.to_owned(), e))?;

    let technology = data["technology"].as_str().or(tech).unwrap_or("generic").to_owned();

    let mut cells = IndexMap::new();
    for (cell_name, cell_data) in data["cells"].entries() {
        let meta = CellMeta {
            pins: cell_data["pins"].members().filter_map(|p| p.as_str()).map(str::to_owned).collect(),
            spice_model: cell_data["spice_model"].as_str().map(str::to_owned),
            parameters: cell_data["parameters"]
                .members()
                .filter_map(|p| p.as_str())
                .map(str::to_owned)
                .collect(),
        };
        cells.insert(cell_name.to_owned(), meta);
    }
    if cells.is_empty() {
        return Err(LibraryError::NoCells(path.to_owned()));
    }

    // A SPICE file given with a relative path lives next to the metadata.
    let spice_file = data["spice_file"].as_str().map(|name| {
        let spice_path = Path::new(name);
        if spice_path.is_absolute() {
            spice_path.to_owned()
        } else {
            path.parent().unwrap_or(Path::new(".")).join(spice_path)
        }
    });
    let spice_file = match spice_file {
        Some(spice_path) if spice_path.exists() => Some(spice_path),
        Some(spice_path) => {
            warn!("SPICE model file not found: {}", spice_path.display());
            None
        }
        None => None,
    };

    info!("loaded {} cells from library: {}", cells.len(), path.display());
    if let Some(spice_path) = &spice_file {
        info!("SPICE model file: {}", spice_path.display());
    }
    Ok(CellLibrary { technology, cells, spice_file })
}

/// Loads the technology library, preferring an explicitly given metadata file
/// over the default library location. Failing to locate any library is fatal.
pub fn load_cell_library(
    metadata_path: Option<&Path>,
    default_path: Option<&Path>,
    tech: Option<&str>,
) -> Result<CellLibrary, LibraryError> {
    if let Some(path) = metadata_path {
        if path.exists() {
            info!("loading cell library from metadata file: {}", path.display());
            return parse_library(path, tech);
        }
    }
    if let Some(path) = default_path {
        if path.exists() {
            info!("loading default cell library from: {}", path.display());
            return parse_library(path, tech);
        }
    }
    Err(LibraryError::NotFound)
}
