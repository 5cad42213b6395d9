//! Instruction text for the two model round-trips.
//!
//! Both builders interpolate the question and the product document verbatim.
//! The output is only meant to be sent as a system instruction; it is not
//! escaped for any other context.

/// Renders the extraction instruction: pick one allowed designation (or null)
/// and copy the attribute phrase out of the question.
pub fn build_extraction_prompt(allowed_designations: &[String], question: &str) -> String {
    let allowed = allowed_designations.join(", ");

    render_lines(&[
        "You are an information extraction engine. Extract the following from the user question:"
            .to_string(),
        format!(
            "- product: Must be EXACTLY one of: {allowed} (case insensitive match). If none is present, return null."
        ),
        "  Near-miss variants of an allowed product (for example an extra or altered suffix such as 6205NP, 6205 LP or 6205 P when only 6205 is allowed) are NOT matches and must return null."
            .to_string(),
        "- attribute: Copy the attribute term or phrase directly from the question (e.g., tolerance class, bore diameter, reference speed). If none is present, return null."
            .to_string(),
        r#"Return strictly a JSON object with exactly these two fields: {"product":string|null,"attribute":string|null}"#
            .to_string(),
        format!("Question: \"{question}\""),
        "JSON:".to_string(),
    ])
}

/// Renders the value-extraction instruction over one product document.
pub fn build_attribute_value_prompt(attribute: &str, product_document_raw: &str) -> String {
    render_lines(&[
        "You are a precise product specification value extractor.".to_string(),
        r#"Given the JSON spec and a target attribute name, output strictly a JSON object with exactly one field: {"value": string|null}"#
            .to_string(),
        "Rules:".to_string(),
        "- Find the attribute by matching its name or symbol case-insensitively.".to_string(),
        "- If a unit field exists for the value, append a space and the unit (e.g., '15 mm')."
            .to_string(),
        "- If there is no unit, return the raw value string.".to_string(),
        r#"- If the value cannot be found with high confidence, return {"value": null}."#
            .to_string(),
        "- Do NOT invent or guess numbers.".to_string(),
        format!("Attribute: {attribute}"),
        "ProductJson:".to_string(),
        product_document_raw.to_string(),
        "JSON only response:".to_string(),
    ])
}

fn render_lines(lines: &[String]) -> String {
    let mut prompt = String::new();
    for line in lines {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::{build_attribute_value_prompt, build_extraction_prompt};

    #[test]
    fn extraction_prompt_lists_allowed_designations_and_question() {
        let allowed = vec!["6205".to_string(), "6206-2Z".to_string()];
        let prompt = build_extraction_prompt(&allowed, "What is the bore of 6205?");

        assert!(prompt.contains("EXACTLY one of: 6205, 6206-2Z"));
        assert!(prompt.contains("case insensitive"));
        assert!(prompt.contains("Near-miss variants"));
        assert!(prompt.contains(r#"{"product":string|null,"attribute":string|null}"#));
        assert!(prompt.contains("Question: \"What is the bore of 6205?\""));
    }

    #[test]
    fn extraction_prompt_is_deterministic() {
        let allowed = vec!["6205".to_string()];
        assert_eq!(
            build_extraction_prompt(&allowed, "bore of 6205"),
            build_extraction_prompt(&allowed, "bore of 6205")
        );
    }

    #[test]
    fn attribute_prompt_embeds_raw_document() {
        let raw = r#"{"designation":"6205","bore":{"value":25,"unit":"mm"}}"#;
        let prompt = build_attribute_value_prompt("bore diameter", raw);

        assert!(prompt.contains("Attribute: bore diameter"));
        assert!(prompt.contains(raw));
        assert!(prompt.contains("case-insensitively"));
        assert!(prompt.contains("append a space and the unit"));
        assert!(prompt.contains(r#"return {"value": null}"#));
        assert!(prompt.contains("Do NOT invent or guess numbers."));
    }
}
