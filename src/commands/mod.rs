/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes these top-level command modules:

- `chat`: interactive analysis conversation
- `catalog`: product list and backend status
*/

use crate::api::HttpBackend;
use crate::commands::special_commands::{
    parse_special_command, print_help, Selection, SpecialCommand,
};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::entry_mode::EntryMode;
use crate::error::{Result, ReviewLensError};

// Special commands parser for the conversation
pub mod special_commands;

// Product list and backend status commands
pub mod catalog;

// Terminal rendering of transcripts
pub mod transcript;

// Chat command handler
pub mod chat {
    //! Interactive conversation handler.
    //!
    //! Creates the HTTP backend and a `Conversation`, then runs a
    //! readline-based loop. Slash commands steer the conversation; any other
    //! input is posted as typed text. While a backend call is in flight a
    //! progress line shows the loading indicator.

    use super::*;
    use crate::commands::transcript::{print_in_place, progress_line, TranscriptCursor};
    use crate::conversation::loading::LoadingIndicator;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::future::Future;
    use std::time::Duration;

    /// Start the interactive conversation
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `mode` - Optional entry mode override ("product" or "url")
    /// * `product` - Product to analyze right away
    /// * `url` - Product URL to analyze right away
    ///
    /// # Examples
    ///
    /// ```
    /// use reviewlens::commands::chat;
    /// use reviewlens::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None, None, None).await?;
    /// ```
    pub async fn run_chat(
        config: Config,
        mode: Option<String>,
        product: Option<String>,
        url: Option<String>,
    ) -> Result<()> {
        tracing::info!("Starting interactive conversation");

        let initial_mode = mode
            .as_deref()
            .map(EntryMode::parse_str)
            .transpose()
            .map_err(ReviewLensError::InvalidInput)?;

        let backend = HttpBackend::new(&config.api)?;
        let mut conversation = Conversation::new(backend, config.chat.clone());
        let mut cursor = TranscriptCursor::new();

        let loading = conversation.loading().clone();
        with_progress(&loading, conversation.initialize()).await;

        if let Some(mode) = initial_mode {
            with_progress(&loading, conversation.select_mode(mode)).await;
        }

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&conversation, &config);
        if conversation.entry_mode() == Some(EntryMode::Product) && product.is_none() {
            print_products(&conversation);
        }

        if let Some(name) = product {
            with_progress(&loading, conversation.submit_product(&name)).await;
        } else if let Some(link) = url {
            with_progress(&loading, conversation.submit_url(&link)).await;
        }
        print_transcript(&mut conversation, &mut cursor);

        loop {
            let prompt = format_prompt(&conversation);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(&conversation, &config);
                            continue;
                        }
                        other => {
                            handle_input(&mut conversation, &loading, other, trimmed).await;
                        }
                    }

                    print_transcript(&mut conversation, &mut cursor);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Runs one conversation intent
    async fn handle_input(
        conversation: &mut Conversation,
        loading: &LoadingIndicator,
        command: SpecialCommand,
        raw: &str,
    ) {
        match command {
            SpecialCommand::SwitchMode(mode) => {
                if with_progress(loading, conversation.select_mode(mode)).await {
                    println!("{} {}\n", mode.colored_tag(), mode.description());
                    if mode == EntryMode::Product {
                        print_products(conversation);
                    }
                } else {
                    println!("분석 중인 상품이 있어 입력 방식을 바꿀 수 없어요. /new 로 새로 시작해 주세요.\n");
                }
            }
            SpecialCommand::SubmitUrl(link) => {
                with_progress(loading, conversation.submit_url(&link)).await;
            }
            SpecialCommand::ListProducts => {
                if conversation.products().is_empty() {
                    with_progress(loading, conversation.load_products()).await;
                }
                print_products(conversation);
            }
            SpecialCommand::SelectProduct(selection) => {
                let name = match &selection {
                    Selection::Name(name) => Some(name.clone()),
                    Selection::Index(_) => selection
                        .resolve(conversation.products(), |p| p.product_name.as_str())
                        .map(|p| p.product_name.clone()),
                };
                match name {
                    Some(name) => {
                        with_progress(loading, conversation.submit_product(&name)).await
                    }
                    None => println!("목록에 없는 번호예요. /products 로 목록을 확인해 주세요.\n"),
                }
            }
            SpecialCommand::SelectFactor(selection) => {
                let key = selection
                    .resolve(conversation.current_factors(), |f| f.factor_key.as_str())
                    .or_else(|| match &selection {
                        Selection::Name(name) => conversation
                            .current_factors()
                            .iter()
                            .find(|f| &f.display_name == name),
                        Selection::Index(_) => None,
                    })
                    .map(|f| f.factor_key.clone())
                    .or_else(|| match selection {
                        Selection::Name(name) => Some(name),
                        Selection::Index(_) => None,
                    });
                match key {
                    Some(key) => with_progress(loading, conversation.select_factor(&key)).await,
                    None => println!("해당 번호의 후회 포인트가 없어요.\n"),
                }
            }
            SpecialCommand::ChooseOption(selection) => {
                let option = match selection {
                    Selection::Name(text) => Some(text),
                    Selection::Index(n) => n
                        .checked_sub(1)
                        .and_then(|i| conversation.current_options().get(i))
                        .cloned(),
                };
                match option {
                    Some(option) => {
                        with_progress(loading, conversation.select_option(&option)).await
                    }
                    None => println!("해당 번호의 선택지가 없어요.\n"),
                }
            }
            SpecialCommand::Rate { stars, target } => {
                let pending = conversation.pending_ratings();
                let request = target
                    .unwrap_or(1)
                    .checked_sub(1)
                    .and_then(|i| pending.get(i))
                    .map(|r| (r.response_file.clone(), r.strategy.clone()));
                match request {
                    Some((file, strategy)) => {
                        with_progress(
                            loading,
                            conversation.rate(&file, strategy.as_deref(), stars),
                        )
                        .await
                    }
                    None => println!("평가할 분석 결과가 없어요.\n"),
                }
            }
            SpecialCommand::Reset => {
                with_progress(loading, conversation.soft_reset()).await;
            }
            SpecialCommand::NewProduct => {
                conversation.full_reset();
                if conversation.entry_mode() == Some(EntryMode::Product) {
                    if conversation.products().is_empty() {
                        with_progress(loading, conversation.load_products()).await;
                    }
                    print_products(conversation);
                }
            }
            SpecialCommand::None => {
                if let Some(name) = catalog_pick(conversation, raw) {
                    with_progress(loading, conversation.submit_product(&name)).await;
                } else {
                    with_progress(loading, conversation.submit_text(raw)).await;
                }
            }
            SpecialCommand::Help | SpecialCommand::ShowStatus | SpecialCommand::Exit => {}
        }
    }

    /// In product mode without a session, a catalog name or number picks it
    fn catalog_pick(conversation: &Conversation, raw: &str) -> Option<String> {
        if conversation.session().is_some()
            || conversation.entry_mode() != Some(EntryMode::Product)
        {
            return None;
        }
        let products = conversation.products();
        let picked = match raw.parse::<usize>() {
            Ok(n) if n > 0 => products.get(n - 1),
            _ => products.iter().find(|p| p.product_name == raw),
        };
        picked.map(|p| p.product_name.clone())
    }

    /// Awaits a conversation intent while a watcher prints its progress
    async fn with_progress<F: Future>(loading: &LoadingIndicator, task: F) -> F::Output {
        let watched = loading.clone();
        let watcher = tokio::spawn(async move {
            let mut shown = false;
            loop {
                tokio::time::sleep(Duration::from_millis(200)).await;
                match progress_line(&watched.snapshot()) {
                    Some(line) => {
                        print_in_place(&line.dimmed().to_string());
                        shown = true;
                    }
                    None if shown => {
                        print_in_place("");
                        shown = false;
                    }
                    None => {}
                }
            }
        });
        let output = task.await;
        watcher.abort();
        print_in_place("");
        output
    }

    fn print_transcript(conversation: &mut Conversation, cursor: &mut TranscriptCursor) {
        let (blocks, restarted) = cursor.take_new(conversation);
        if restarted {
            println!("{}", "──────── 대화를 다시 시작했어요 ────────".dimmed());
        }
        for block in blocks {
            println!("{}", block);
        }
        if let Some(notice) = conversation.take_notice() {
            println!("{} {}\n", "봇 ›".cyan().bold(), notice);
        }
    }

    fn print_products(conversation: &Conversation) {
        if conversation.products().is_empty() {
            println!("분석할 수 있는 상품이 없어요. /url 로 상품 URL을 입력해 보세요.\n");
            return;
        }
        println!();
        catalog::products_table(conversation.products()).printstd();
        println!("상품 번호나 이름을 입력하세요 (예: /select 1)\n");
    }

    fn format_prompt(conversation: &Conversation) -> String {
        let tag = match conversation.entry_mode() {
            Some(mode) => mode.colored_tag(),
            None => "[-]".dimmed().to_string(),
        };
        match conversation.session() {
            Some(session) => format!("{} {} >> ", tag, session.product_name.bold()),
            None => format!("{} >> ", tag),
        }
    }

    /// Display welcome banner at the start of the conversation
    fn print_welcome_banner(conversation: &Conversation, config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            ReviewLens - 리뷰 후회 포인트 분석                ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Backend: {}", config.api.base_url);
        match conversation.entry_mode() {
            Some(mode) => println!("Mode:    {} ({})", mode.colored_tag(), mode.description()),
            None => println!("Mode:    /product 또는 /url 로 입력 방식을 선택하세요"),
        }
        println!("\nType '/help' for available commands, 'exit' to quit\n");
    }

    /// Display detailed status information about the current conversation
    fn print_status_display(conversation: &Conversation, config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  ReviewLens Session Status                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Backend:           {}", config.api.base_url);
        println!(
            "Entry Mode:        {}",
            conversation
                .entry_mode()
                .map(|m| m.colored_tag())
                .unwrap_or_else(|| "none".to_string())
        );
        println!("State:             {:?}", conversation.state());
        match conversation.session() {
            Some(session) => {
                println!("Session:           {}", session.id);
                println!("Product:           {}", session.product_name);
                println!(
                    "Category:          {}",
                    session.category.as_deref().unwrap_or("-")
                );
                println!("Turns:             {}", session.turn_count);
            }
            None => println!("Session:           none"),
        }
        println!("Conversation Size: {} messages", conversation.messages().len());
        println!("Pending Ratings:   {}", conversation.pending_ratings().len());
        println!("Errors Shown:      {}", conversation.error_count());
        println!();
    }

}
