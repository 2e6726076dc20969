//! Prompt text for the metric-extraction collaborator.

pub const SYSTEM_PROMPT: &str = "You output strict JSON. Output an array of objects like \
[{\"metric\": \"Revenue\", \"value_previous\": \"₹100M\", \"value_current\": \"₹110M\", \
\"sub_components\": [\"Product Sales\"], \"page\": \"1\", \"snippet\": \"Total revenue reached\"}].";

/// Upstream text extraction inserts page markers; anything past this many
/// characters is dropped to stay inside the model's context budget.
pub const MAX_PROMPT_CHARS: usize = 30_000;

pub fn build_user_prompt(text: &str) -> String {
    let truncated: String = text.chars().take(MAX_PROMPT_CHARS).collect();

    format!(
        "You are an expert financial auditor specializing in Indian financial reporting. \
        Extract key financial metrics from the provided text, which includes page number \
        markers (e.g., --- PAGE 1 ---). \
        Return a strictly formatted JSON array of objects. \
        Each object MUST have EXACTLY these keys:\n\
        1. 'metric': The name of the financial metric.\n\
        2. 'value_previous': The exact extracted value for the previous period (as a string with currency, or '-' if missing).\n\
        3. 'value_current': The exact extracted value for the current period (as a string with currency, or '-' if missing).\n\
        4. 'sub_components': An array of strings listing the names of any child metrics that sum up to this metric \
        (e.g. ['Product Revenue', 'Service Revenue']). Leave empty [] if none.\n\
        5. 'page': The absolute page number where you found this metric.\n\
        6. 'snippet': A short, exact 5-8 word quote from the text surrounding the metric to prove its source.\n\n\
        CRITICAL INSTRUCTIONS:\n\
        1. Look for side-by-side columns representing the current period and the previous period.\n\
        2. Always format financial values exactly as written (e.g. '₹ 100 Lakhs', '(15.5)%').\n\
        3. Extract fundamental metrics like Revenue, Gross Margin, Net Income.\n\n\
        Text to strictly analyze:\n{}",
        truncated
    )
}
