// Transcript export: static font metrics, paginated layout, PDF serialization.
// Layout is CPU-bound; handlers run it inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod pdf;

pub use font_metrics::{default_page_config, PageConfig};

use crate::chat::Transcript;

/// Renders the transcript as PDF bytes. Same transcript and config, same bytes.
pub fn export_transcript(transcript: &Transcript, config: &PageConfig) -> Vec<u8> {
    let document = layout::layout_transcript(transcript, config);
    pdf::render_pdf(&document, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::ts;
    use crate::chat::{Role, Turn};

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_empty_transcript_exports_title_only() {
        let pdf = as_text(export_transcript(&Transcript::new(), &default_page_config()));
        assert!(pdf.starts_with("%PDF-"));
        assert!(pdf.contains("/Count 1"));
        assert_eq!(pdf.matches(" Tj ET").count(), 1);
        assert!(pdf.contains("(Chat History) Tj"));
    }

    #[test]
    fn test_exchange_exports_headers_and_bodies() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::new(Role::User, "What is overfitting?", ts("2024-01-01 10:00:00")));
        transcript.append(Turn::new(Role::Assistant, "Overfitting is...", ts("2024-01-01 10:00:01")));

        let pdf = as_text(export_transcript(&transcript, &default_page_config()));
        let user_header = pdf.find("([2024-01-01 10:00:00] User:)").unwrap();
        let question = pdf.find("(What is overfitting?)").unwrap();
        let ai_header = pdf.find("([2024-01-01 10:00:01] AI:)").unwrap();
        let answer = pdf.find("(Overfitting is...)").unwrap();
        assert!(user_header < question && question < ai_header && ai_header < answer);
        assert!(pdf.contains("/F2 12.00 Tf"), "headers are bold");
    }

    #[test]
    fn test_oversized_turn_paginates_without_clipping() {
        let words: Vec<String> = (0..3000).map(|i| format!("token{i}")).collect();
        let mut transcript = Transcript::new();
        transcript.append(Turn::new(Role::Assistant, words.join(" "), ts("2024-01-01 10:00:00")));

        let pdf = as_text(export_transcript(&transcript, &default_page_config()));
        assert!(!pdf.contains("/Count 1 "), "expected more than one page");
        assert!(pdf.matches("/Type /Page ").count() > 1);
        for word in &words {
            assert!(pdf.contains(word.as_str()), "{word} missing from export");
        }
        assert!(pdf.contains("token2999"));
    }

    #[test]
    fn test_export_is_deterministic() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::new(Role::User, "repeatable?", ts("2024-01-01 10:00:00")));
        let config = default_page_config();
        assert_eq!(
            export_transcript(&transcript, &config),
            export_transcript(&transcript, &config)
        );
    }
}
