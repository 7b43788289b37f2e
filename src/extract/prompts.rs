//! Prompt templates for extraction calls.

/// Maximum characters of page text sent to a model.
pub const MAX_PAGE_CHARS: usize = 15_000;

/// Truncate on a UTF-8 character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Prompt for pulling job listings out of a search results page.
pub fn listings_prompt(source_name: &str, page_text: &str, max_results: usize) -> String {
    format!(
        r#"You are a job listing parser. Extract job listings from the following {source} search results page.

Page Content:
{content}

Extract up to {max} visible job listings. For each job, provide:
- title: Job title
- company: Company name
- location: Location/city
- salary: Salary if shown (or null)
- postedDate: When posted (e.g., "2 days ago", "Posted today")
- workType: full-time, part-time, contract, casual (if shown)
- remote: true if remote/hybrid mentioned

Return a JSON array of jobs:
[
  {{
    "title": "Software Engineer",
    "company": "TechCorp",
    "location": "Sydney",
    "salary": "$120,000 - $150,000",
    "postedDate": "2 days ago",
    "workType": "full-time",
    "remote": false
  }}
]

Return ONLY valid JSON array, no other text. If no jobs found, return []."#,
        source = source_name,
        content = truncate_chars(page_text, MAX_PAGE_CHARS),
        max = max_results,
    )
}

/// Prompt for turning a full job posting page into a `JobPosting`.
pub fn job_posting_prompt(page_text: &str, url: &str) -> String {
    format!(
        r#"You are a job posting parser. The following text was read from the job posting at {url}.

Page Content:
{content}

Extract:
- jobTitle: the position title
- company: the hiring company
- location: where the role is based (or null)
- salary: salary or rate if stated (or null)
- jobDescription: the full description of the role, responsibilities and requirements, without navigation, cookie banners or unrelated page text

Return ONLY a JSON object with exactly these keys, no other text."#,
        url = url,
        content = truncate_chars(page_text, MAX_PAGE_CHARS),
    )
}
