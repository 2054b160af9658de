// Prompt constants for the research task units.
// System prompts get the shared reply envelope appended via
// `llm_client::prompts::with_reply_envelope`.

pub const COMPANY_RESEARCH_ROLE: &str = "You are a web researcher. \
    Your only job is to describe a company's mission, vision, values and culture \
    using the web search results you are given. \
    If the results do not describe the company behind the given website, \
    report an error instead of guessing.";

/// Replace: {company_url}, {search_results}
pub const COMPANY_RESEARCH_PROMPT_TEMPLATE: &str = r#"Company official website: {company_url}

WEB SEARCH RESULTS:
{search_results}

Summarize what these results say about the company in Markdown:
- Mission and vision
- Values
- Culture and ways of working
- Products or domain, in one or two sentences

Use only facts present in the search results."#;

pub const JOB_INFORMATION_ROLE: &str = "You are a dedicated assistant that fetches \
    information about a job role from extracted web page content. \
    Copy all relevant information about the role without rewording sentences. \
    Remove everything not directly related to the role: navigation, menu items, \
    buttons, cookie banners, copyright notices. \
    If the content contains no job role, report an error.";

/// Replace: {job_url}, {web_content}
pub const JOB_INFORMATION_PROMPT_TEMPLATE: &str = r#"Job posting URL: {job_url}

EXTRACTED WEB CONTENT:
{web_content}

Return the job title, description, responsibilities, required skills,
qualifications and any other information about this specific role."#;

pub const CV_PROFILE_ROLE: &str = "You are a CV parser. \
    Extract the candidate's profile from CV text. \
    If the text is not a CV, report an error.";

/// Replace: {cv_text}
pub const CV_PROFILE_PROMPT_TEMPLATE: &str = r#"CV TEXT:
{cv_text}

Extract the following in Markdown:
- Name
- Summary
- Skills
- Work experience
- Education

Do not include e-mail addresses or phone numbers."#;
