use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Progress {
        saved: u32,
        expected: u32,
    }

    #[test]
    fn raw_is_single_line() {
        let value = Progress {
            saved: 3,
            expected: 4,
        };
        assert_eq!(
            render(&value, OutputFormat::Raw).unwrap(),
            r#"{"saved":3,"expected":4}"#
        );
    }

    #[test]
    fn json_is_pretty() {
        let value = Progress {
            saved: 0,
            expected: 0,
        };
        let rendered = render(&value, OutputFormat::Json).unwrap();
        assert_eq!(rendered, "{\n  \"saved\": 0,\n  \"expected\": 0\n}");
    }
}
