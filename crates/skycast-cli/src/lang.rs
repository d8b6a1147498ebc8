//! Subcommand: `skycast lang` -- inspect and edit language preferences.

use std::path::Path;

use anyhow::Result;
use skycast_lang::{LanguageConfig, LanguageService};

use crate::cli::LangAction;
use crate::config::{AppConfig, db_path_from_lookup};
use crate::helpers::{env_non_empty, open_stores};

pub async fn cmd_lang(config_path: &Path, action: LangAction) -> Result<()> {
    let config = AppConfig::load(config_path);
    let db_path = db_path_from_lookup(env_non_empty);
    let stores = open_stores(config.store.backend, &db_path).await?;
    let service = LanguageService::new(stores.language, LanguageConfig::from_env());

    match action {
        LangAction::List => {
            let config = service.config();
            for lang in service.list_supported() {
                if lang == config.default_lang() {
                    println!("{lang} (default)");
                } else {
                    println!("{lang}");
                }
            }
        }
        LangAction::Get { user_id } => match service.get_language(&user_id).await? {
            Some(lang) => println!("{lang}"),
            None => println!("(none)"),
        },
        LangAction::Set { user_id, lang } => {
            let lang = service.set_language(&user_id, &lang).await?;
            println!("{user_id}: {lang}");
        }
        LangAction::Clear { user_id } => {
            service.clear_language(&user_id).await?;
            println!("{user_id}: cleared");
        }
        LangAction::Resolve { user_id, text } => {
            let resolution = service.ensure_language(&user_id, text.as_deref()).await;
            println!("{} ({})", resolution.lang, resolution.source);
        }
        LangAction::Detect { text } => match service.detect(&text) {
            Some(lang) => println!("{lang}"),
            None => println!("(no match)"),
        },
    }
    Ok(())
}
