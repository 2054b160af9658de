// Prompt constants for the cover-letter generator.
// The system prompt gets the shared reply envelope appended via
// `llm_client::prompts::with_reply_envelope`.

/// Replace: {language_level}, {max_words}
pub const GENERATION_ROLE_TEMPLATE: &str = "You are a professional cover letter writer. \
    Write a professional, well-structured cover letter using only the research and CV \
    material you are given.

<Constraints>
- Keep the letter brief and concise, up to {max_words} words.
- Do not include any numerical metrics.
- Do not invent facts about the company, the role or the candidate.
</Constraints>

<Style>
- Use English grammar and vocabulary appropriate to the {language_level} level (CEFR).
- ALWAYS include bullet points of the values the candidate could bring to the company.
- Do not add placeholders for date, subject line, company name or address at the top.
- Do not add the candidate's e-mail, phone number or job title in the closing.
</Style>

Return the letter in Markdown as the message of a success reply. \
If the material is not enough to write a letter, reply with an error and the reason.";

/// Replace: {company_section}, {job_section}, {candidate_section}
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"COMPANY RESEARCH:
{company_section}

JOB ROLE:
{job_section}

CANDIDATE:
{candidate_section}

Write the cover letter for this candidate and role."#;

/// Stands in for a research section whose task failed.
pub const UNAVAILABLE_SECTION: &str = "(unavailable: this research step did not succeed; \
    do not guess its content)";
