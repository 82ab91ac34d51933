//! Line-oriented scanning of SPICE library text for `.SUBCKT` bodies and
//! `.MODEL` cards.

use indexmap::IndexMap;
use log::{debug, warn};

/// One `.SUBCKT` body: the formal port list and the instance lines it
/// contains. Only device (`M`) and subcircuit call (`X`) lines are kept, with
/// `+` continuation lines joined onto the instance they continue; comments
/// and simulator directives inside the body are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcircuitDefinition {
    pub name: String,
    pub ports: Vec<String>,
    pub instances: Vec<String>,
}

/// Splits a `.SUBCKT` header into the subcircuit name and its port list.
pub fn parse_subckt_header(line: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next()?;
    if !keyword.eq_ignore_ascii_case(".subckt") {
        return None;
    }
    let name = tokens.next()?.to_owned();
    Some((name, tokens.map(str::to_owned).collect()))
}

/// Whether a trimmed line instantiates a device or a subcircuit.
pub fn is_instance_line(line: &str) -> bool {
    matches!(line.chars().next(), Some('M' | 'm' | 'X' | 'x'))
}

/// Collects every `.SUBCKT` definition from SPICE text, keyed by name.
///
/// `.ENDS` with a mismatched or missing name still closes the current body
/// with a warning; an unterminated body at end of input is kept as-is.
pub fn parse_subcircuits(text: &str) -> IndexMap<String, SubcircuitDefinition> {
    let mut subcircuits = IndexMap::new();
    let mut current: Option<SubcircuitDefinition> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some((name, ports)) = parse_subckt_header(line) {
            if let Some(open) = current.take() {
                warn!("subcircuit {} not closed before {} begins", open.name, name);
                subcircuits.insert(open.name.clone(), open);
            }
            current = Some(SubcircuitDefinition { name, ports, instances: Vec::new() });
            continue;
        }
        if line.get(..5).is_some_and(|keyword| keyword.eq_ignore_ascii_case(".ends")) {
            let Some(done) = current.take() else {
                warn!(".ENDS outside of any subcircuit");
                continue;
            };
            if let Some(closed_name) = line.split_whitespace().nth(1) {
                if closed_name != done.name {
                    warn!(".ENDS {} closes subcircuit {}", closed_name, done.name);
                }
            }
            debug!("parsed subcircuit {} with {} instances", done.name, done.instances.len());
            subcircuits.insert(done.name.clone(), done);
            continue;
        }
        if let Some(open) = &mut current {
            if is_instance_line(line) {
                open.instances.push(line.to_owned());
            } else if let Some(rest) = line.strip_prefix('+') {
                match open.instances.last_mut() {
                    Some(last) => {
                        last.push(' ');
                        last.push_str(rest.trim());
                    }
                    None => warn!("continuation line with nothing to continue in {}", open.name),
                }
            }
        }
    }

    if let Some(open) = current {
        warn!("subcircuit {} not terminated by .ENDS", open.name);
        subcircuits.insert(open.name.clone(), open);
    }
    subcircuits
}

/// Collects `.MODEL` cards from SPICE text, keyed by model name. The whole
/// card line is kept verbatim so it can be replayed into the output.
pub fn extract_models(text: &str) -> IndexMap<String, String> {
    let mut models = IndexMap::new();
    for line in text.lines() {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else { continue };
        if !keyword.eq_ignore_ascii_case(".model") {
            continue;
        }
        let (Some(name), Some(_kind)) = (tokens.next(), tokens.next()) else {
            warn!("malformed .MODEL card: {:?}", line);
            continue;
        };
        models.insert(name.to_owned(), line.to_owned());
    }
    models
}
