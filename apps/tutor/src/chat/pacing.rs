//! Paced output: cosmetic word-by-word reveal of an already complete answer.
//!
//! `Paced<S>` decorates any `ChunkSink`; the stored transcript never sees it.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("output receiver went away")]
pub struct SinkClosed;

/// Destination for pieces of presentation output.
#[async_trait]
pub trait ChunkSink: Send {
    async fn write_chunk(&mut self, chunk: String) -> Result<(), SinkClosed>;
}

#[async_trait]
impl ChunkSink for mpsc::Sender<String> {
    async fn write_chunk(&mut self, chunk: String) -> Result<(), SinkClosed> {
        self.send(chunk).await.map_err(|_| SinkClosed)
    }
}

#[async_trait]
impl ChunkSink for Vec<String> {
    async fn write_chunk(&mut self, chunk: String) -> Result<(), SinkClosed> {
        self.push(chunk);
        Ok(())
    }
}

/// Splits each chunk into words and forwards them one at a time, `delay` apart.
/// Spacing and line breaks travel with the words.
pub struct Paced<S> {
    inner: S,
    delay: Duration,
}

impl<S: ChunkSink> Paced<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<S: ChunkSink> ChunkSink for Paced<S> {
    async fn write_chunk(&mut self, chunk: String) -> Result<(), SinkClosed> {
        for word in words_with_spacing(&chunk) {
            self.inner.write_chunk(word.to_string()).await?;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        Ok(())
    }
}

/// Splits text into words, each carrying the whitespace that follows it, so the
/// pieces concatenate back to the original text. Leading whitespace joins the
/// first word; whitespace-only text yields nothing.
fn words_with_spacing(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut seen_word = false;
    let mut in_word = false;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if !is_space && !in_word && seen_word {
            words.push(&text[start..i]);
            start = i;
        }
        seen_word |= !is_space;
        in_word = !is_space;
    }
    if seen_word {
        words.push(&text[start..]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_paced_forwards_every_word_in_order() {
        let mut paced = Paced::new(Vec::new(), Duration::from_millis(20));
        let started = Instant::now();

        paced
            .write_chunk("Overfitting is   when a\nmodel memorises".to_string())
            .await
            .unwrap();

        assert_eq!(
            paced.inner,
            ["Overfitting ", "is   ", "when ", "a\n", "model ", "memorises"]
        );
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_zero_delay_does_not_sleep() {
        let mut paced = Paced::new(Vec::new(), Duration::ZERO);
        paced.write_chunk("a b c".to_string()).await.unwrap();
        assert_eq!(paced.inner.concat(), "a b c");
    }

    #[tokio::test]
    async fn test_markdown_layout_survives_the_reveal() {
        let answer = "  ## Steps\n\n1. Split data\n2. Fit\n\n```python\nmodel.fit(X)\n```";
        let mut paced = Paced::new(Vec::new(), Duration::ZERO);
        paced.write_chunk(answer.to_string()).await.unwrap();

        assert_eq!(paced.inner.concat(), answer);
        assert_eq!(paced.inner[0], "  ## ");
        assert_eq!(paced.inner[1], "Steps\n\n");
    }

    #[tokio::test]
    async fn test_empty_text_writes_nothing() {
        let mut paced = Paced::new(Vec::new(), Duration::ZERO);
        paced.write_chunk("  \n ".to_string()).await.unwrap();
        assert!(paced.inner.is_empty());
    }

    #[tokio::test]
    async fn test_channel_sink_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut paced = Paced::new(tx, Duration::ZERO);
        assert_eq!(
            paced.write_chunk("hello".to_string()).await,
            Err(SinkClosed)
        );
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_words() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut paced = Paced::new(tx, Duration::ZERO);
        paced.write_chunk("two words".to_string()).await.unwrap();
        drop(paced);

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.push(chunk);
        }
        assert_eq!(received, ["two ", "words "]);
    }
}
