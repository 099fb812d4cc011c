//! Answer synthesis.

use crate::error::PipelineResult;
use crate::rag::context::NO_DATA_CONTEXT;
use crate::rag::rules::opening_sentence;

/// Instructions given to model-backed generators.
pub const SYSTEM_PROMPT: &str = "\
You are an expert oceanographer and data analyst specializing in ARGO float data.
You help users explore and understand oceanographic data through natural language queries.

ARGO floats are autonomous profiling floats that measure ocean properties like:
- Temperature (TEMP)
- Salinity (PSAL)
- Pressure (PRES)
- Dissolved Oxygen (DOXY)
- Chlorophyll-a (CHLA)
- pH levels
- Nitrate concentrations
- Backscattering (BBP700)

When answering queries:
1. Use the provided context from the ARGO database
2. Provide specific, data-driven responses
3. Explain oceanographic concepts when relevant
4. Suggest visualizations when appropriate
5. Be precise about geographic locations and time periods
6. Acknowledge limitations if data is insufficient

Always maintain scientific accuracy and explain your reasoning.";

/// Produces the answer text from a question and its rendered context.
///
/// Implementations backed by a language model should send
/// [`SYSTEM_PROMPT`] along with the question and context.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, query: &str, context: &str) -> PipelineResult<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Deterministic answers built from the query topic.
///
/// Used when no model is configured; the text only says whether anything
/// was retrieved, never what.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

const FOUND_BULLETS: [&str; 3] = [
    "\n- Multiple float profiles were found matching your query",
    "- Data includes measurements from various locations and time periods",
    "- You can visualize this data using the dashboard charts",
];

const NOT_FOUND_BULLETS: [&str; 2] = [
    "\n- No specific data found matching your exact criteria",
    "- Try broadening your search parameters or check different time periods",
];

impl TextGenerator for TemplateGenerator {
    fn generate(&self, query: &str, context: &str) -> PipelineResult<String> {
        let mut lines = vec![opening_sentence(query)];
        if context.contains(NO_DATA_CONTEXT) {
            lines.extend(NOT_FOUND_BULLETS);
        } else {
            lines.extend(FOUND_BULLETS);
        }
        Ok(lines.join("\n"))
    }

    fn name(&self) -> &str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_with_data() {
        let text = TemplateGenerator
            .generate("salinity near the equator", "RELEVANT ARGO DATA:\n...")
            .unwrap();
        assert_eq!(
            text,
            "Based on the ARGO float data, here's what I found about salinity:\n\
             \n- Multiple float profiles were found matching your query\n\
             - Data includes measurements from various locations and time periods\n\
             - You can visualize this data using the dashboard charts"
        );
    }

    #[test]
    fn test_template_without_data() {
        let text = TemplateGenerator
            .generate("where are the floats", NO_DATA_CONTEXT)
            .unwrap();
        assert_eq!(
            text,
            "Based on the available ARGO float data:\n\
             \n- No specific data found matching your exact criteria\n\
             - Try broadening your search parameters or check different time periods"
        );
    }

    #[test]
    fn test_system_prompt_lists_parameters() {
        for code in ["TEMP", "PSAL", "PRES", "DOXY", "CHLA", "BBP700"] {
            assert!(SYSTEM_PROMPT.contains(code), "missing {code}");
        }
    }
}
