//! Order-stable JSON text emitter
//!
//! Object keys are written in the order of the best-matching field-order
//! template (most shared keys, first declared on a tie); keys the template
//! does not name follow in sorted order. Scalar arrays stay on one line and
//! get `", "` separators when shorter than [`SHORT_ARRAY`] elements.

use std::fmt::Write as _;

use serde_json::{Map, Number, Value};

/// Scalar arrays shorter than this get a space after each comma
pub const SHORT_ARRAY: usize = 6;

const INDENT: &str = "  ";

/// Output layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Style {
    /// Two-space indentation, one member per line
    #[default]
    Pretty,
    /// No whitespace at all
    Compact,
}

// ============================================================================
// Field-order templates
// ============================================================================

const DOCUMENT_ORDER: &[&str] = &[
    "metadata",
    "scale",
    "materials",
    "vertices",
    "normals",
    "colors",
    "uvs",
    "faces",
    "bones",
    "skinIndices",
    "skinWeights",
    "animation",
];

const METADATA_ORDER: &[&str] = &[
    "formatVersion",
    "generatedBy",
    "vertices",
    "faces",
    "normals",
    "colors",
    "uvs",
    "materials",
    "bones",
];

const MATERIAL_ORDER: &[&str] = &[
    "DbgColor",
    "DbgIndex",
    "DbgName",
    "shading",
    "colorDiffuse",
    "colorAmbient",
    "colorSpecular",
    "specularCoef",
    "transparency",
    "transparent",
    "doubleSided",
    "flipSided",
    "vertexColors",
    "mapDiffuse",
    "mapDiffuseRepeat",
    "mapSpecular",
    "mapSpecularRepeat",
    "mapBump",
    "mapBumpRepeat",
    "mapNormal",
    "mapNormalRepeat",
];

const BONE_ORDER: &[&str] = &["parent", "name", "pos", "rotq"];

const ANIMATION_ORDER: &[&str] = &["name", "fps", "length", "hierarchy"];

const TRACK_ORDER: &[&str] = &["parent", "keys"];

const KEY_ORDER: &[&str] = &["time", "pos", "rot", "scl"];

/// Templates in declaration order; earlier ones win ties
pub const KEY_ORDERS: &[(&str, &[&str])] = &[
    ("document", DOCUMENT_ORDER),
    ("metadata", METADATA_ORDER),
    ("material", MATERIAL_ORDER),
    ("bone", BONE_ORDER),
    ("animation", ANIMATION_ORDER),
    ("track", TRACK_ORDER),
    ("key", KEY_ORDER),
];

/// The template sharing the most keys with `map`, if any shares one
pub fn template_for(map: &Map<String, Value>) -> Option<(&'static str, &'static [&'static str])> {
    let mut best = None;
    let mut best_score = 0;

    for &(name, order) in KEY_ORDERS {
        let score = order.iter().filter(|k| map.contains_key(**k)).count();
        if score > best_score {
            best = Some((name, order));
            best_score = score;
        }
    }

    best
}

/// Keys of `map` in output order
pub fn ordered_keys(map: &Map<String, Value>) -> Vec<&str> {
    let order = template_for(map).map(|(_, order)| order).unwrap_or(&[]);

    let mut keys: Vec<&str> = order
        .iter()
        .copied()
        .filter(|k| map.contains_key(*k))
        .collect();

    let mut rest: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|k| !order.contains(k))
        .collect();
    rest.sort_unstable();
    keys.extend(rest);

    keys
}

// ============================================================================
// Emitter
// ============================================================================

/// Serialise `value` with stable key order
pub fn to_ordered_string(value: &Value, style: Style) -> String {
    let mut emitter = Emitter {
        out: String::new(),
        style,
        depth: 0,
    };
    emitter.value(value);
    emitter.out
}

struct Emitter {
    out: String,
    style: Style,
    depth: usize,
}

impl Emitter {
    fn value(&mut self, value: &Value) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.number(n),
            Value::String(s) => self.string(s),
            Value::Array(items) => self.array(items),
            Value::Object(map) => self.object(map),
        }
    }

    fn number(&mut self, n: &Number) {
        if let Some(i) = n.as_i64() {
            let _ = write!(self.out, "{}", i);
        } else if let Some(u) = n.as_u64() {
            let _ = write!(self.out, "{}", u);
        } else if let Some(f) = n.as_f64() {
            // Display never uses exponent notation and drops a zero fraction
            let _ = write!(self.out, "{}", f);
        }
    }

    fn string(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn array(&mut self, items: &[Value]) {
        if items.is_empty() {
            self.out.push_str("[]");
            return;
        }

        let nested = items.iter().any(|v| v.is_array() || v.is_object());
        if !nested || self.style == Style::Compact {
            let separator = if self.style == Style::Pretty && items.len() < SHORT_ARRAY {
                ", "
            } else {
                ","
            };
            self.out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(separator);
                }
                self.value(item);
            }
            self.out.push(']');
            return;
        }

        self.out.push('[');
        self.depth += 1;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline();
            self.value(item);
        }
        self.depth -= 1;
        self.newline();
        self.out.push(']');
    }

    fn object(&mut self, map: &Map<String, Value>) {
        if map.is_empty() {
            self.out.push_str("{}");
            return;
        }

        let colon = match self.style {
            Style::Pretty => ": ",
            Style::Compact => ":",
        };

        self.out.push('{');
        self.depth += 1;
        for (i, key) in ordered_keys(map).into_iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline();
            self.string(key);
            self.out.push_str(colon);
            if let Some(value) = map.get(key) {
                self.value(value);
            }
        }
        self.depth -= 1;
        self.newline();
        self.out.push('}');
    }

    fn newline(&mut self) {
        if self.style == Style::Pretty {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_template_best_overlap() {
        let bone = json!({ "rotq": [0, 0, 0, 1], "name": "hip", "parent": -1, "pos": [0, 0, 0] });
        assert_eq!(template_for(bone.as_object().unwrap()).map(|t| t.0), Some("bone"));

        let track = json!({ "keys": [], "parent": 0 });
        assert_eq!(template_for(track.as_object().unwrap()).map(|t| t.0), Some("track"));

        let meta = json!({ "formatVersion": 3.1, "vertices": 4, "faces": 1 });
        assert_eq!(template_for(meta.as_object().unwrap()).map(|t| t.0), Some("metadata"));
    }

    #[test]
    fn test_template_tie_keeps_first_declared() {
        // "vertices" and "faces" appear in both document and metadata templates
        let map = json!({ "vertices": [], "faces": [] });
        assert_eq!(template_for(map.as_object().unwrap()).map(|t| t.0), Some("document"));
    }

    #[test]
    fn test_no_overlap_sorts_keys() {
        let map = json!({ "zeta": 1, "alpha": 2 });
        assert_eq!(template_for(map.as_object().unwrap()), None);
        assert_eq!(ordered_keys(map.as_object().unwrap()), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_unknown_keys_follow_template() {
        let map = json!({ "extra": true, "time": 0.5, "pos": [1, 2, 3] });
        assert_eq!(
            ordered_keys(map.as_object().unwrap()),
            vec!["time", "pos", "extra"]
        );
    }

    #[test]
    fn test_number_format() {
        let value = json!([1.0, 0.5, -2, 3.1, 0.001, 1e20]);
        assert_eq!(
            to_ordered_string(&value, Style::Pretty),
            "[1,0.5,-2,3.1,0.001,100000000000000000000]"
        );
    }

    #[test]
    fn test_short_array_spacing() {
        assert_eq!(to_ordered_string(&json!([1, 2, 3]), Style::Pretty), "[1, 2, 3]");
        assert_eq!(
            to_ordered_string(&json!([1, 2, 3, 4, 5, 6]), Style::Pretty),
            "[1,2,3,4,5,6]"
        );
        assert_eq!(to_ordered_string(&json!([1, 2, 3]), Style::Compact), "[1,2,3]");
        assert_eq!(to_ordered_string(&json!([]), Style::Pretty), "[]");
    }

    #[test]
    fn test_pretty_layout() {
        let value = json!({
            "keys": [{ "time": 0, "scl": [1, 1, 1] }, { "time": 1.5 }],
            "parent": -1
        });
        let expected = "{\n  \"parent\": -1,\n  \"keys\": [\n    {\n      \"time\": 0,\n      \"scl\": [1, 1, 1]\n    },\n    {\n      \"time\": 1.5\n    }\n  ]\n}";
        assert_eq!(to_ordered_string(&value, Style::Pretty), expected);
    }

    #[test]
    fn test_compact_layout() {
        let value = json!({ "pos": [0, 1, 0], "parent": 0, "name": "a\"b", "rotq": [0, 0, 0, 1] });
        assert_eq!(
            to_ordered_string(&value, Style::Compact),
            r#"{"parent":0,"name":"a\"b","pos":[0,1,0],"rotq":[0,0,0,1]}"#
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = Map::new();
        a.insert("time".to_string(), json!(0.5));
        a.insert("rot".to_string(), json!([0, 0, 0, 1]));
        a.insert("pos".to_string(), json!([1, 2, 3]));

        let mut b = Map::new();
        b.insert("pos".to_string(), json!([1, 2, 3]));
        b.insert("time".to_string(), json!(0.5));
        b.insert("rot".to_string(), json!([0, 0, 0, 1]));

        assert_eq!(
            to_ordered_string(&Value::Object(a), Style::Pretty),
            to_ordered_string(&Value::Object(b), Style::Pretty)
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            to_ordered_string(&json!("a\\b\n\u{1}"), Style::Compact),
            r#""a\\b\n\u0001""#
        );
    }
}
