use gate2spice_netlist::{Cell, CellKind, Design, Module, TopModuleError};

fn module_instantiating(name: &str, child: &str) -> Module {
    let mut module = Module::new(name);
    module.cells.insert("u0".to_owned(), Cell::new(CellKind::Other(child.to_owned())));
    module
}

#[test]
fn empty_design_has_no_top() {
    let design = Design::new();
    assert!(matches!(design.top_module(None), Err(TopModuleError::Empty)));
    assert!(matches!(design.top_module(Some("top")), Err(TopModuleError::Empty)));
}

#[test]
fn explicit_name_matches_exactly() {
    let mut design = Design::new();
    design.add_module(Module::new("alu"));
    design.add_module(Module::new("top"));
    assert_eq!(design.top_module(Some("alu")).unwrap().name, "alu");
}

#[test]
fn explicit_name_matches_across_escape_marker() {
    let mut design = Design::new();
    design.add_module(Module::new("\\counter"));
    assert_eq!(design.top_module(Some("counter")).unwrap().name, "\\counter");

    let mut design = Design::new();
    design.add_module(Module::new("counter"));
    assert_eq!(design.top_module(Some("\\counter")).unwrap().name, "counter");
}

#[test]
fn explicit_name_missing_reports_available_modules() {
    let mut design = Design::new();
    design.add_module(Module::new("\\alu"));
    design.add_module(Module::new("decoder"));
    match design.top_module(Some("cpu")) {
        Err(TopModuleError::NotFound { name, available }) => {
            assert_eq!(name, "cpu");
            assert_eq!(available, vec!["alu".to_owned(), "decoder".to_owned()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn single_module_is_top() {
    let mut design = Design::new();
    design.add_module(Module::new("only"));
    assert_eq!(design.top_module(None).unwrap().name, "only");
}

#[test]
fn uninstantiated_module_is_top() {
    let mut design = Design::new();
    design.add_module(Module::new("alu"));
    design.add_module(module_instantiating("cpu", "alu"));
    assert_eq!(design.top_module(None).unwrap().name, "cpu");
}

#[test]
fn instantiation_check_ignores_escape_marker() {
    let mut design = Design::new();
    design.add_module(Module::new("\\alu"));
    design.add_module(module_instantiating("cpu", "alu"));
    assert_eq!(design.top_module(None).unwrap().name, "cpu");
}

#[test]
fn all_modules_instantiated_falls_back_to_first() {
    let mut design = Design::new();
    design.add_module(module_instantiating("a", "b"));
    design.add_module(module_instantiating("b", "a"));
    assert_eq!(design.top_module(None).unwrap().name, "a");
}
