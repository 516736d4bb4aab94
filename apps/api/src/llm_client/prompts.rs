// Cross-cutting prompt fragments. Each module that talks to the LLM
// keeps its own prompts.rs next to its code; this file holds the pieces
// they share.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
