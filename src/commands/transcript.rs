//! Terminal rendering of conversation transcripts
//!
//! Messages render to plain lines with colored role prefixes. Markdown is
//! shown as its source, which reads well in a terminal.

use crate::conversation::analysis::{AnalysisView, ViewPoint};
use crate::conversation::loading::LoadingStatus;
use crate::conversation::message::{Message, MessageBody, MessageKind, Role};
use crate::conversation::Conversation;
use crate::presentation::{format_timestamp, rating_stars, risk_label};
use chrono::{DateTime, Local};
use colored::Colorize;
use std::fmt::Write as _;
use std::io::Write as _;

/// Tracks which transcript messages were already printed
///
/// A reset truncates the transcript; the cursor notices when the message it
/// printed last is gone and starts over from the top.
#[derive(Debug, Default)]
pub struct TranscriptCursor {
    printed: usize,
    last: Option<(DateTime<Local>, String)>,
}

impl TranscriptCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders messages added since the last call
    ///
    /// Returns the rendered blocks and whether the transcript restarted.
    pub fn take_new(&mut self, conversation: &Conversation) -> (Vec<String>, bool) {
        let messages = conversation.messages();
        let still_there = match (&self.last, self.printed.checked_sub(1)) {
            (Some((timestamp, text)), Some(index)) => messages
                .get(index)
                .map(|m| &m.timestamp == timestamp && m.text() == text.as_str())
                .unwrap_or(false),
            _ => true,
        };
        let restarted = !still_there;
        if restarted {
            self.printed = 0;
        }

        let pending = conversation.pending_ratings();

        let blocks = messages[self.printed.min(messages.len())..]
            .iter()
            .map(|message| {
                let rating_number = message
                    .rating
                    .as_ref()
                    .filter(|r| r.pending)
                    .and_then(|r| pending.iter().position(|p| *p == r))
                    .map(|i| i + 1);
                render_message(message, rating_number)
            })
            .collect();

        self.printed = messages.len();
        self.last = messages
            .last()
            .map(|m| (m.timestamp, m.text().to_string()));
        (blocks, restarted)
    }
}

/// Renders one message
///
/// `rating_number` is the message's position among pending rating
/// requests, used for the `/rate` hint.
pub fn render_message(message: &Message, rating_number: Option<usize>) -> String {
    let mut out = String::new();
    let time = format_timestamp(&message.timestamp).dimmed();

    match message.role {
        Role::User => {
            let _ = writeln!(out, "{} {}  {}", "나 ›".green().bold(), message.text(), time);
        }
        Role::Bot => {
            let prefix = match message.kind {
                Some(MessageKind::Error) => "봇 !".red().bold(),
                Some(MessageKind::Alert) => "봇 ※".yellow().bold(),
                Some(MessageKind::Analyze) => "봇 ›".cyan().bold(),
                Some(MessageKind::Search) => "봇 ›".blue().bold(),
                None => "봇 ›".bold(),
            };
            match &message.body {
                MessageBody::Text { text } => {
                    let _ = writeln!(out, "{} {}  {}", prefix, text, time);
                }
                MessageBody::Markup { source, .. } => {
                    let _ = writeln!(out, "{} {}  {}", prefix, source, time);
                }
                MessageBody::Analysis(view) => {
                    let _ = writeln!(out, "{}  {}", prefix, time);
                    out.push_str(&render_analysis(view));
                }
            }
        }
    }

    for review in &message.reviews {
        let stars = review.rating.map(rating_stars).unwrap_or_default();
        let _ = writeln!(out, "    {} \"{}\"", stars.yellow(), review.text);
    }

    if let Some(factors) = &message.regret_points {
        for (i, factor) in factors.iter().enumerate() {
            let _ = writeln!(out, "    {}. {} ({})", i + 1, factor.display_name, factor.factor_key);
        }
        if !factors.is_empty() {
            let _ = writeln!(out, "    {}", "/factor <번호> 로 관련 리뷰를 볼 수 있어요".dimmed());
        }
    }

    for (i, option) in message.options.iter().enumerate() {
        let _ = writeln!(out, "    [{}] {}", i + 1, option);
    }
    if !message.options.is_empty() {
        let _ = writeln!(out, "    {}", "/choose <번호> 로 답할 수 있어요".dimmed());
    }

    if let Some(n) = rating_number {
        let _ = writeln!(out, "    {}", format!("/rate <1-5> {} 로 평가해 주세요", n).dimmed());
    }

    out
}

/// Renders a structured analysis block
pub fn render_analysis(view: &AnalysisView) -> String {
    let mut out = String::new();
    let title = match &view.strategy_label {
        Some(label) => format!("{} 리뷰 분석 결과 · {}", view.product_name, label),
        None => format!("{} 리뷰 분석 결과", view.product_name),
    };
    let _ = writeln!(out, "  {}", title.bold());

    let summary = &view.summary;
    if let Some(text) = &summary.summary {
        let _ = writeln!(out, "  {}", text);
    }

    if !summary.key_findings.is_empty() {
        let _ = writeln!(out, "  {}", "주요 후회 포인트".underline());
        for finding in &summary.key_findings {
            let factor = finding.factor.as_deref().unwrap_or("-");
            let risk = finding
                .risk_level
                .as_deref()
                .map(|level| format!(" [위험도 {}]", risk_label(level)))
                .unwrap_or_default();
            let _ = writeln!(out, "   - {}{}", factor, risk);
            if let Some(said) = &finding.what_users_say {
                let _ = writeln!(out, "     {}", said);
            }
        }
    }

    if let Some(view) = &summary.balanced_view {
        write_points(&mut out, "장점", &view.pros);
        write_points(&mut out, "단점", &view.cons);
        write_points(&mut out, "상황에 따라", &view.mixed);
    }

    if let Some(rule) = &summary.decision_rule {
        write_lines(&mut out, "이런 분께 추천해요", &rule.if_buy);
        write_lines(&mut out, "이런 분은 고민해 보세요", &rule.if_hold);
    }

    if let Some(text) = &summary.final_recommendation {
        let _ = writeln!(out, "  {} {}", "최종 추천:".bold(), text);
    }
    if let Some(text) = &summary.one_line_tip {
        let _ = writeln!(out, "  {} {}", "한 줄 팁:".bold(), text);
    }
    out
}

fn write_points(out: &mut String, heading: &str, points: &[ViewPoint]) {
    let lines: Vec<String> = points.iter().map(|p| p.text().to_string()).collect();
    write_lines(out, heading, &lines);
}

fn write_lines(out: &mut String, heading: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}", heading.underline());
    for line in lines {
        let _ = writeln!(out, "   - {}", line);
    }
}

/// One-line progress text for an active loading indicator
pub fn progress_line(status: &LoadingStatus) -> Option<String> {
    if !status.active {
        return None;
    }
    const FRAMES: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];
    let frame = FRAMES[(status.elapsed_seconds % FRAMES.len() as u64) as usize];
    Some(format!("{} {} ({}초)", frame, status.text, status.elapsed_seconds))
}

/// Overwrites the current terminal line
pub fn print_in_place(line: &str) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "\r\x1b[2K{}", line);
    let _ = stdout.flush();
}
