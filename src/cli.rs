use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};

use crate::model::config::AppConfig;
use crate::output;
use crate::plugin::{ConfigEngine, ConfigLocator, ListSelector};
use crate::registry::{NpmRegistry, Registry, search};

#[derive(Debug, Parser)]
#[command(name = "hpm", version, about = "Plugin manager for HyperTerm")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install a plugin
    #[command(visible_alias = "i")]
    Install {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        plugin: String,
        /// Add to `localPlugins` instead of `plugins`
        #[arg(long)]
        local: bool,
    },
    /// Uninstall a plugin
    #[command(visible_aliases = ["u", "rm", "remove"])]
    Uninstall {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        plugin: String,
        /// Remove from `localPlugins` instead of `plugins`
        #[arg(long)]
        local: bool,
    },
    /// List installed plugins
    #[command(visible_alias = "ls")]
    List {
        /// List `localPlugins` instead of `plugins`
        #[arg(long)]
        local: bool,
    },
    /// Search for plugins on npm
    #[command(visible_alias = "s")]
    Search { query: String },
    /// List plugins available on npm
    LsRemote,
}

/// How a command ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// An expected refusal, such as installing a plugin twice.
    Declined,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Declined => ExitCode::FAILURE,
        }
    }
}

fn selector(local: bool) -> ListSelector {
    if local {
        ListSelector::Local
    } else {
        ListSelector::Global
    }
}

pub fn run(cli: Cli, config: &AppConfig) -> Result<Outcome> {
    match cli.command {
        Command::Install { plugin, local } => {
            let Some(mut engine) = load_engine()? else {
                return Ok(Outcome::Declined);
            };
            let registry = NpmRegistry::new(&config.registry)?;
            install(&mut engine, &registry, &plugin, selector(local))
        }
        Command::Uninstall { plugin, local } => {
            let Some(mut engine) = load_engine()? else {
                return Ok(Outcome::Declined);
            };
            uninstall(&mut engine, &plugin, selector(local))
        }
        Command::List { local } => {
            let Some(engine) = load_engine()? else {
                return Ok(Outcome::Declined);
            };
            list(&engine, selector(local))
        }
        Command::Search { query } => {
            let registry = NpmRegistry::new(&config.registry)?;
            search_plugins(&registry, config, &query)
        }
        Command::LsRemote => {
            let registry = NpmRegistry::new(&config.registry)?;
            ls_remote(&registry, config)
        }
    }
}

/// Loads the HyperTerm config, or prints the "not installed" notice and
/// returns `None` when there is none.
fn load_engine() -> Result<Option<ConfigEngine>> {
    let locator =
        ConfigLocator::from_home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let engine = ConfigEngine::load(&locator)
        .with_context(|| format!("failed to load {}", locator.resolve().display()))?;

    if !engine.exists() {
        tracing::warn!(path = %engine.config_path().display(), "HyperTerm config missing");
        output::not_installed_terminal();
        return Ok(None);
    }

    Ok(Some(engine))
}

fn install(
    engine: &mut ConfigEngine,
    registry: &dyn Registry,
    plugin: &str,
    selector: ListSelector,
) -> Result<Outcome> {
    if engine.is_installed(plugin, selector) {
        output::failure(&format!("{plugin} is already installed"));
        return Ok(Outcome::Declined);
    }

    // Local plugins live on disk, not on npm.
    if selector == ListSelector::Global {
        let published = registry.is_name_taken(plugin).map_err(|err| {
            tracing::warn!(plugin, error = %err, "registry lookup failed");
            anyhow::Error::new(err).context("could not reach the npm registry")
        })?;
        if !published {
            output::failure(&format!("{plugin} not found on npm"));
            return Ok(Outcome::Declined);
        }
    }

    match engine.install(plugin, selector) {
        Ok(()) => {
            output::success(&format!("{plugin} installed successfully!"));
            Ok(Outcome::Done)
        }
        Err(err) if err.is_expected() => {
            output::failure(&err.to_string());
            Ok(Outcome::Declined)
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!(
            "failed to install {plugin} into {}",
            engine.config_path().display()
        ))),
    }
}

fn uninstall(engine: &mut ConfigEngine, plugin: &str, selector: ListSelector) -> Result<Outcome> {
    match engine.uninstall(plugin, selector) {
        Ok(()) => {
            output::success(&format!("{plugin} uninstalled successfully!"));
            Ok(Outcome::Done)
        }
        Err(err) if err.is_expected() => {
            output::failure(&err.to_string());
            Ok(Outcome::Declined)
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!(
            "failed to uninstall {plugin} from {}",
            engine.config_path().display()
        ))),
    }
}

fn list(engine: &ConfigEngine, selector: ListSelector) -> Result<Outcome> {
    match engine.list(selector) {
        Some(plugins) => {
            for plugin in plugins {
                println!("{plugin}");
            }
        }
        None => output::failure("No plugins installed yet."),
    }
    Ok(Outcome::Done)
}

fn search_plugins(registry: &dyn Registry, config: &AppConfig, query: &str) -> Result<Outcome> {
    let entries = match registry.query_by_keyword(&config.registry.keyword) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "registry query failed");
            output::step_failed("Searching");
            return Err(err).context("could not reach the npm registry");
        }
    };

    let hits = search::filter(entries, query, config.search.max_results);
    if hits.is_empty() {
        output::step_failed("Searching");
        output::failure(&format!("Your search '{query}' did not match any plugins"));
        output::failure("Try `hpm ls-remote`");
        return Ok(Outcome::Declined);
    }

    output::step_ok("Searching");
    output::plugin_table(&hits);
    Ok(Outcome::Done)
}

fn ls_remote(registry: &dyn Registry, config: &AppConfig) -> Result<Outcome> {
    let entries = match registry.query_by_keyword(&config.registry.keyword) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "registry query failed");
            output::step_failed("Searching");
            return Err(err).context("could not reach the npm registry");
        }
    };

    output::step_ok("Searching");
    output::plugin_table(&entries);
    Ok(Outcome::Done)
}
