// Prompt constants shared by the chat session and the analysis helpers.

/// Tutor instruction prepended to every request.
pub const SYSTEM_PROMPT: &str = "You are an AI Data Science Tutor.
- Provide structured insights for **Finance, Healthcare, Retail, and Manufacturing**.
- Offer **ML model suggestions, hyperparameter tuning, and dataset recommendations**.
- Explain **concepts with examples and code snippets** when needed.
- Format responses using **headings, bullet points, and markdown formatting**.";

/// Resume review prompt prefix. The pasted or extracted resume text follows it.
pub const RESUME_ANALYSIS_PREFIX: &str = "Analyze this resume for a data science job:\n\n";

/// Dataset analysis prompt prefix. The text preview of the upload follows it.
pub const DATASET_ANALYSIS_PREFIX: &str = "Analyze this dataset:\n\n";
