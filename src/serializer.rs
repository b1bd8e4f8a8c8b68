//! JSON form of a laid-out diagram, for callers that draw it themselves.

use crate::diagram::Diagram;

pub fn to_json(diagram: &Diagram) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(diagram)
}
