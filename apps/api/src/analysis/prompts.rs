// Lead analysis prompt templates. `{transcript}` is replaced verbatim.

/// Reply the next-question prompt uses to say the conversation can stop.
pub const END_SENTINEL: &str = "END";

pub const NEXT_QUESTION_SYSTEM: &str = "\
You are an admission counselor AI for a university admissions team. \
You speak politely and ask one short question at a time.";

pub const NEXT_QUESTION_PROMPT: &str = r#"Given this conversation:
{transcript}

Decide the next best question to ask the prospective applicant.
Reply with the question only, no preamble.
If enough information is collected (interest level, budget, timeline and program of interest), reply with: END."#;

pub const EXTRACT_AND_SCORE_PROMPT: &str = r#"From this conversation between an admission counselor and a prospective applicant:
{transcript}

Extract structured fields:
- interest_level: "high" | "medium" | "low"
- budget: string or null
- timeline: string or null
- program_interest: string or null

Then give:
- score: integer from 0 to 100
- category: "Hot" | "Warm" | "Cold"
- summary: two or three sentences

OUTPUT SCHEMA (return exactly this structure):
{
  "extracted_fields": {
    "interest_level": "high",
    "budget": "string" | null,
    "timeline": "string" | null,
    "program_interest": "string" | null
  },
  "score": 0,
  "category": "Hot",
  "summary": "string"
}

Return ONLY the JSON object — nothing else, no code fences."#;

/// Substitutes the transcript into a template.
pub fn render(template: &str, transcript: &str) -> String {
    template.replace("{transcript}", transcript)
}
