use anyhow::Result;

use crate::fetch::ExtractionResult;

/// Render the result document as JSON, compact by default.
pub fn render(result: &ExtractionResult, pretty: bool) -> Result<String> {
    let content = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(content)
}

/// Emit the result document on stdout. Diagnostics go to stderr via tracing,
/// so this is the only stdout output and callers can parse it directly.
pub fn print_result(result: &ExtractionResult, pretty: bool) -> Result<()> {
    println!("{}", render(result, pretty)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_compact_is_single_line() {
        let result = ExtractionResult::failure("vid", "boom".to_string(), "direct");
        let rendered = render(&result, false).unwrap();
        assert!(!rendered.contains('\n'));
        assert!(rendered.starts_with('{'));
    }

    #[test]
    fn test_render_pretty_parses_back() {
        let result = ExtractionResult::failure("vid", "boom".to_string(), "direct");
        let rendered = render(&result, true).unwrap();
        let parsed: ExtractionResult = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, result);
    }
}
