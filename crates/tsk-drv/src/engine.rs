//! The engine: configuration, entities, pipeline, store and hooks
//! threaded through one value passed to every pass.

use tracing::debug;

use tsk_cli::{Entities, Pipeline};
use tsk_core::{columns, Config, Hooks, Store, Task};
use tsk_expr::{Eval, ValueContext};
use tsk_util::Result;

use crate::commands;
use crate::dispatcher;
use crate::filter::Filter;
use tsk_core::hooks::HookEvent;

/// One command invocation's state.
pub struct Engine {
    pub config: Config,
    pub pipeline: Pipeline,
    pub eval: Eval,
    pub store: Store,
    pub hooks: Hooks,
}

impl Engine {
    /// Build the engine: scan overrides, load configuration, seed
    /// entities, run the argument pipeline.
    pub fn bootstrap(argv: Vec<String>, stdin_words: Vec<String>) -> Result<Engine> {
        // Overrides must be visible before the configuration loads,
        // so a light pre-scan runs ahead of the pipeline.
        let mut rc_override: Option<String> = None;
        let mut overrides: Vec<(String, String)> = Vec::new();
        for arg in argv.iter().skip(1) {
            if arg == "--" {
                break;
            }
            if let Some(path) = arg.strip_prefix("rc:") {
                rc_override = Some(path.to_string());
            } else if let Some(setting) = arg.strip_prefix("rc.") {
                if let Some(sep) = setting.find('=').or_else(|| setting.find(':')) {
                    overrides.push((
                        setting[..sep].to_string(),
                        setting[sep + 1..].to_string(),
                    ));
                }
            }
        }

        let rc_path = Config::rc_path(rc_override.as_deref());
        let mut config = Config::load(&rc_path)?;
        for (name, value) in &overrides {
            config.set(name, value);
        }
        debug!(rc = %rc_path.display(), "configuration loaded");

        let entities = seed_entities(&config);
        let mut modifiable = columns::modifiable_names();
        modifiable.extend(config.uda_names());

        let mut pipeline = Pipeline::new(
            entities,
            config.aliases(),
            config.default_command(),
            modifiable,
        );
        pipeline.capture(&argv);
        pipeline.capture_stdin(&stdin_words);
        pipeline.analyze()?;

        // Aliases may have introduced more overrides.
        for (name, value) in pipeline.config_overrides() {
            config.set(&name, &value);
        }

        let ctx = ValueContext {
            dateformat: config.get("dateformat").unwrap_or("m/d/Y").to_string(),
            weekstart: config.weekstart(),
            case_sensitive: config.get_bool("search.case.sensitive"),
        };
        let eval = Eval::new(ctx);

        let data_dir = config.data_dir();
        let store = Store::new(data_dir.clone())?;
        let hooks = Hooks::new(&data_dir, config.get_bool("hooks"));

        Ok(Engine {
            config,
            pipeline,
            eval,
            store,
            hooks,
        })
    }

    /// Dispatch the selected command. Returns the process exit code.
    pub fn execute(&mut self) -> Result<i32> {
        let command = match self.pipeline.command() {
            Some((canonical, _)) => canonical,
            None => {
                println!("{}", commands::misc::usage());
                return Ok(0);
            }
        };

        let def = dispatcher::lookup(&command).ok_or_else(|| {
            tsk_util::Error::Unknown(format!("'{}' is not a command", command))
        })?;

        self.hooks.run(HookEvent::OnLaunch, None)?;

        if def.read_only {
            self.store.lock_shared()?;
        } else {
            self.store.lock_exclusive()?;
        }

        let result = commands::execute(self, def);
        self.store.unlock();
        let output = result?;
        if !output.is_empty() {
            println!("{}", output);
        }

        self.hooks.run(HookEvent::OnExit, None)?;
        Ok(0)
    }

    /// Compile the pipeline's filter tokens.
    pub fn compile_filter(&self) -> Result<Filter> {
        Filter::compile(&self.eval, self.pipeline.filter_tokens())
    }

    /// Filtered pending tasks (clones).
    pub fn selected_pending(&mut self, filter: &Filter) -> Result<Vec<Task>> {
        self.store.load_pending()?;
        let mut selected = Vec::new();
        for task in self.store.pending() {
            if filter.pass(&self.eval, task, &self.config)? {
                selected.push(task.clone());
            }
        }
        Ok(selected)
    }

    /// Filtered tasks from both stores; the completed store loads only
    /// when the filter shape requires it.
    pub fn selected_all(&mut self, filter: &Filter, force_completed: bool) -> Result<Vec<Task>> {
        self.store.load_pending()?;
        if force_completed || (!filter.is_empty() && !filter.skips_completed()) {
            self.store.load_completed()?;
        }
        let mut selected = Vec::new();
        for task in self
            .store
            .pending()
            .iter()
            .chain(self.store.completed().iter())
        {
            if filter.pass(&self.eval, task, &self.config)? {
                selected.push(task.clone());
            }
        }
        Ok(selected)
    }

    /// The decomposed modification set (clones). Words after the `--`
    /// terminator join the set as literal description words.
    pub fn modifications(&self) -> Vec<tsk_cli::Arg> {
        let mut mods: Vec<tsk_cli::Arg> = self
            .pipeline
            .modification_args()
            .into_iter()
            .cloned()
            .collect();
        for word in self.pipeline.terminated_words() {
            mods.push(tsk_cli::Arg::tagged(word, tsk_cli::ArgTag::Modification));
        }
        mods
    }
}

/// Seed the entity registry from the command table, the columns, the
/// configuration's UDAs and the operator table.
fn seed_entities(config: &Config) -> Entities {
    let mut entities = Entities::new();

    for name in dispatcher::command_names() {
        entities.add("cmd", name);
    }
    for name in dispatcher::write_command_names() {
        entities.add("writecmd", name);
    }
    for name in dispatcher::helper_names() {
        entities.add("helper", name);
    }
    for name in columns::names() {
        entities.add("attribute", name);
    }
    for name in config.uda_names() {
        entities.add("uda", &name);
        entities.add("attribute", &name);
    }
    entities.add("pseudo", "limit");
    for name in [
        "before",
        "after",
        "under",
        "over",
        "below",
        "above",
        "none",
        "any",
        "is",
        "isnt",
        "equals",
        "not",
        "has",
        "contains",
        "hasnt",
        "startswith",
        "endswith",
        "left",
        "right",
        "word",
        "noword",
    ] {
        entities.add("modifier", name);
    }
    for name in tsk_expr::ops::names() {
        entities.add("operator", name);
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_entities() {
        let entities = seed_entities(&Config::default());
        assert!(entities.exact_match("cmd", "list"));
        assert!(entities.exact_match("writecmd", "done"));
        assert!(!entities.exact_match("writecmd", "list"));
        assert!(entities.exact_match("attribute", "project"));
        assert!(entities.exact_match("operator", "_hastag_"));
        assert!(entities.exact_match("modifier", "before"));
        assert!(entities.exact_match("pseudo", "limit"));
    }
}
