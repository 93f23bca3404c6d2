use std::{fmt, path::PathBuf};

use serde_json::Value;

use crate::{
    blur_cpu::validate_kernel_size,
    error::{ReelError, ReelResult},
    model::StepDecl,
};

pub const DEFAULT_BLUR_KERNEL: (u32, u32) = (7, 7);
pub const DEFAULT_TEXT_POSITION: (i32, i32) = (50, 50);
pub const DEFAULT_TEXT_COLOR: [u8; 3] = [0, 255, 0];

/// One resolved pipeline operation with its typed arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    AppendVideo {
        path: PathBuf,
    },
    AppendImage {
        path: PathBuf,
    },
    /// `start`/`count` stay signed so that negative input surfaces as a precondition failure when
    /// the step runs.
    Cut {
        start: i64,
        count: i64,
    },
    Grayscale,
    ToMultiChannel,
    Blur {
        kernel: (u32, u32),
    },
    OverlayText {
        text: String,
        position: (i32, i32),
        color: [u8; 3],
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::AppendVideo { .. } => "append_video",
            Step::AppendImage { .. } => "append_image",
            Step::Cut { .. } => "cut",
            Step::Grayscale => "grayscale",
            Step::ToMultiChannel => "to_multi_channel",
            Step::Blur { .. } => "blur",
            Step::OverlayText { .. } => "overlay_text",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::AppendVideo { path } | Step::AppendImage { path } => {
                write!(f, "{}({:?})", self.name(), path.display().to_string())
            }
            Step::Cut { start, count } => write!(f, "cut({start}, {count})"),
            Step::Grayscale | Step::ToMultiChannel => write!(f, "{}()", self.name()),
            Step::Blur { kernel } => write!(f, "blur({}, {})", kernel.0, kernel.1),
            Step::OverlayText {
                text,
                position,
                color,
            } => write!(
                f,
                "overlay_text({text:?}, ({}, {}), ({}, {}, {}))",
                position.0, position.1, color[0], color[1], color[2]
            ),
        }
    }
}

/// Resolve a raw `[operation, args...]` declaration against the catalog.
pub fn resolve_step(decl: &StepDecl) -> ReelResult<Step> {
    let op = decl.op()?;
    let args = decl.args();
    let key = normalize_op(op);

    match key.as_str() {
        "appendvideo" => {
            expect_arity(op, args, 1, 1)?;
            Ok(Step::AppendVideo {
                path: PathBuf::from(get_str(op, args, 0)?),
            })
        }
        "appendimage" => {
            expect_arity(op, args, 1, 1)?;
            Ok(Step::AppendImage {
                path: PathBuf::from(get_str(op, args, 0)?),
            })
        }
        "cut" => {
            expect_arity(op, args, 2, 2)?;
            Ok(Step::Cut {
                start: get_i64(op, args, 0)?,
                count: get_i64(op, args, 1)?,
            })
        }
        "grayscale" | "tograyscale" => {
            expect_arity(op, args, 0, 0)?;
            Ok(Step::Grayscale)
        }
        "tomultichannel" | "ensure3channel" => {
            expect_arity(op, args, 0, 0)?;
            Ok(Step::ToMultiChannel)
        }
        "blur" | "blurframes" => {
            expect_arity(op, args, 0, 1)?;
            let kernel = match args.first() {
                Some(v) => {
                    let (w, h) = get_pair(op, 0, v)?;
                    (to_u32(op, 0, w)?, to_u32(op, 0, h)?)
                }
                None => DEFAULT_BLUR_KERNEL,
            };
            validate_kernel_size(kernel)?;
            Ok(Step::Blur { kernel })
        }
        "overlaytext" => {
            expect_arity(op, args, 1, 3)?;
            let text = get_str(op, args, 0)?.to_string();
            let position = match args.get(1) {
                Some(v) => {
                    let (x, y) = get_pair(op, 1, v)?;
                    (to_i32(op, 1, x)?, to_i32(op, 1, y)?)
                }
                None => DEFAULT_TEXT_POSITION,
            };
            let color = match args.get(2) {
                Some(v) => get_rgb(op, 2, v)?,
                None => DEFAULT_TEXT_COLOR,
            };
            Ok(Step::OverlayText {
                text,
                position,
                color,
            })
        }
        _ => Err(ReelError::validation(format!(
            "unknown pipeline operation '{op}'"
        ))),
    }
}

/// Case-insensitive with `_` and `-` ignored: `appendVideo`, `append_video` and
/// `append-video` all resolve to the same operation.
fn normalize_op(op: &str) -> String {
    op.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn expect_arity(op: &str, args: &[Value], min: usize, max: usize) -> ReelResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min}..={max}")
        };
        return Err(ReelError::validation(format!(
            "operation '{op}' takes {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn get_str<'a>(op: &str, args: &'a [Value], idx: usize) -> ReelResult<&'a str> {
    args.get(idx).and_then(Value::as_str).ok_or_else(|| {
        ReelError::validation(format!("operation '{op}' argument {idx} must be a string"))
    })
}

fn get_i64(op: &str, args: &[Value], idx: usize) -> ReelResult<i64> {
    args.get(idx).and_then(Value::as_i64).ok_or_else(|| {
        ReelError::validation(format!(
            "operation '{op}' argument {idx} must be an integer"
        ))
    })
}

fn get_pair(op: &str, idx: usize, v: &Value) -> ReelResult<(i64, i64)> {
    let items = v.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
        ReelError::validation(format!(
            "operation '{op}' argument {idx} must be a pair of integers"
        ))
    })?;
    let n = |v: &Value| {
        v.as_i64().ok_or_else(|| {
            ReelError::validation(format!(
                "operation '{op}' argument {idx} must be a pair of integers"
            ))
        })
    };
    Ok((n(&items[0])?, n(&items[1])?))
}

fn get_rgb(op: &str, idx: usize, v: &Value) -> ReelResult<[u8; 3]> {
    let err = || {
        ReelError::validation(format!(
            "operation '{op}' argument {idx} must be three integers in 0..=255"
        ))
    };
    let items = v.as_array().filter(|a| a.len() == 3).ok_or_else(err)?;
    let mut out = [0u8; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        let n = item.as_u64().ok_or_else(err)?;
        *slot = u8::try_from(n).map_err(|_| err())?;
    }
    Ok(out)
}

fn to_u32(op: &str, idx: usize, n: i64) -> ReelResult<u32> {
    u32::try_from(n).map_err(|_| {
        ReelError::validation(format!(
            "operation '{op}' argument {idx} is out of range ({n})"
        ))
    })
}

fn to_i32(op: &str, idx: usize, n: i64) -> ReelResult<i32> {
    i32::try_from(n).map_err(|_| {
        ReelError::validation(format!(
            "operation '{op}' argument {idx} is out of range ({n})"
        ))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decl(v: Value) -> StepDecl {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn resolves_every_catalog_operation() {
        assert_eq!(
            resolve_step(&decl(json!(["append_video", "maw.webm"]))).unwrap(),
            Step::AppendVideo {
                path: PathBuf::from("maw.webm")
            }
        );
        assert_eq!(
            resolve_step(&decl(json!(["appendImage", "huh.png"]))).unwrap(),
            Step::AppendImage {
                path: PathBuf::from("huh.png")
            }
        );
        assert_eq!(
            resolve_step(&decl(json!(["cut", 300, 50]))).unwrap(),
            Step::Cut {
                start: 300,
                count: 50
            }
        );
        assert_eq!(
            resolve_step(&decl(json!(["to_grayscale"]))).unwrap(),
            Step::Grayscale
        );
        assert_eq!(
            resolve_step(&decl(json!(["ensure_3channel"]))).unwrap(),
            Step::ToMultiChannel
        );
        assert_eq!(
            resolve_step(&decl(json!(["blur", [9, 5]]))).unwrap(),
            Step::Blur { kernel: (9, 5) }
        );
        assert_eq!(
            resolve_step(&decl(json!(["overlay-text", "Cats", [30, 60], [255, 200, 200]])))
                .unwrap(),
            Step::OverlayText {
                text: "Cats".to_string(),
                position: (30, 60),
                color: [255, 200, 200],
            }
        );
    }

    #[test]
    fn optional_arguments_take_defaults() {
        assert_eq!(
            resolve_step(&decl(json!(["blur"]))).unwrap(),
            Step::Blur {
                kernel: DEFAULT_BLUR_KERNEL
            }
        );
        assert_eq!(
            resolve_step(&decl(json!(["overlay_text", "x"]))).unwrap(),
            Step::OverlayText {
                text: "x".to_string(),
                position: DEFAULT_TEXT_POSITION,
                color: DEFAULT_TEXT_COLOR,
            }
        );
    }

    #[test]
    fn negative_cut_arguments_resolve() {
        assert_eq!(
            resolve_step(&decl(json!(["cut", -1, 5]))).unwrap(),
            Step::Cut {
                start: -1,
                count: 5
            }
        );
    }

    #[test]
    fn configuration_errors_are_validation_errors() {
        for bad in [
            json!(["explode"]),
            json!([]),
            json!([42]),
            json!(["cut", 1]),
            json!(["cut", 1, 2.5]),
            json!(["grayscale", 1]),
            json!(["blur", [4, 4]]),
            json!(["blur", [0, 3]]),
            json!(["blur", [-3, 3]]),
            json!(["overlay_text", "x", [1, 2], [0, 256, 0]]),
            json!(["overlay_text", "x", [1, 2, 3]]),
            json!(["append_video", 7]),
        ] {
            let err = resolve_step(&decl(bad.clone())).unwrap_err();
            assert!(
                matches!(err, ReelError::Validation(_)),
                "{bad} gave {err:?}"
            );
        }
    }

    #[test]
    fn display_names_operation_and_arguments() {
        assert_eq!(
            Step::Cut {
                start: 100,
                count: 200
            }
            .to_string(),
            "cut(100, 200)"
        );
        assert_eq!(
            Step::AppendVideo {
                path: PathBuf::from("food.webm")
            }
            .to_string(),
            "append_video(\"food.webm\")"
        );
        assert_eq!(Step::Grayscale.to_string(), "grayscale()");
        assert_eq!(
            Step::OverlayText {
                text: "Cats".into(),
                position: (30, 60),
                color: [255, 200, 200],
            }
            .to_string(),
            "overlay_text(\"Cats\", (30, 60), (255, 200, 200))"
        );
    }
}
