//! ImageDescription mini-language
//!
//! The description tag carries whitespace separated keyword groups:
//!
//! ```text
//! CRS <name>
//! DATUM <lat> <lon> <alt>
//! SHIFT <x> <y> <z> <yaw>
//! HEADING <yaw>
//! NAME <word>
//! TYPE <word>
//! ```
//!
//! Groups may appear in any order and a repeated keyword overrides the
//! earlier one. A group whose arguments do not parse is ignored as a whole.
//! Words outside any group are kept in order as free text.

use std::fmt;
use crate::projection::{Coordinate, Datum, Euler, Pose};
use crate::types::Crs;

/// Fields decoded from (or to be encoded into) an image description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Description {
    pub crs: Option<Crs>,
    pub datum: Option<Datum>,
    pub shift: Option<Pose>,
    pub name: Option<String>,
    pub layer_type: Option<String>,
    /// Words that belong to no keyword group
    pub extra: Vec<String>,
}

impl Description {
    /// Decodes a description string
    pub fn parse(text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut desc = Description::default();
        let mut i = 0;

        while i < tokens.len() {
            let args = &tokens[i + 1..];
            let consumed = match tokens[i] {
                "CRS" => match args.first() {
                    Some(name) => {
                        if let Some(crs) = Crs::from_name(name) {
                            desc.crs = Some(crs);
                        }
                        1
                    }
                    None => 0,
                },
                "DATUM" => match parse_floats::<3>(args) {
                    Some([lat, lon, alt]) => {
                        desc.datum = Some(Datum::new(lat, lon, alt));
                        3
                    }
                    None => 0,
                },
                "SHIFT" => match parse_floats::<4>(args) {
                    Some([x, y, z, yaw]) => {
                        desc.shift = Some(Pose::new(Coordinate::new_3d(x, y, z), Euler::from_yaw(yaw)));
                        4
                    }
                    None => 0,
                },
                "HEADING" => match parse_floats::<1>(args) {
                    Some([yaw]) => {
                        let point = desc.shift.map(|pose| pose.point).unwrap_or_default();
                        desc.shift = Some(Pose::new(point, Euler::from_yaw(yaw)));
                        1
                    }
                    None => 0,
                },
                "NAME" => match args.first() {
                    Some(name) => {
                        desc.name = Some(name.to_string());
                        1
                    }
                    None => 0,
                },
                "TYPE" => match args.first() {
                    Some(kind) => {
                        desc.layer_type = Some(kind.to_string());
                        1
                    }
                    None => 0,
                },
                "CRS" | "DATUM" | "SHIFT" | "HEADING" | "NAME" | "TYPE" => 0,
                word => {
                    desc.extra.push(word.to_string());
                    0
                }
            };
            i += 1 + consumed;
        }

        desc
    }

    /// Whether the description anchors the layer with a DATUM
    pub fn has_datum(&self) -> bool {
        self.datum.is_some()
    }
}

/// Encodes the present fields in the canonical order
/// `CRS`, `DATUM`, `SHIFT`, `NAME`, `TYPE`, then the free text
impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if let Some(crs) = self.crs {
            parts.push(format!("CRS {}", crs));
        }
        if let Some(datum) = self.datum {
            parts.push(format!("DATUM {} {} {}", datum.lat, datum.lon, datum.alt));
        }
        if let Some(shift) = self.shift {
            parts.push(format!(
                "SHIFT {} {} {} {}",
                shift.point.x, shift.point.y, shift.point.z, shift.angle.yaw
            ));
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            parts.push(format!("NAME {}", name));
        }
        if let Some(kind) = self.layer_type.as_deref().filter(|t| !t.is_empty()) {
            parts.push(format!("TYPE {}", kind));
        }
        parts.extend(self.extra.iter().cloned());

        f.write_str(&parts.join(" "))
    }
}

fn parse_floats<const N: usize>(args: &[&str]) -> Option<[f64; N]> {
    if args.len() < N {
        return None;
    }
    let mut values = [0.0; N];
    for (value, arg) in values.iter_mut().zip(args) {
        *value = arg.parse().ok()?;
    }
    Some(values)
}
