use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dharma_core::{
    ActionTable, Archetype, EngineConfig, FactorCatalog, ManifestationEngine, SceneLibrary,
    TraitStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dharma", version, about = "Mental-factor character simulation")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the factor catalog
    Factors,
    /// List the built-in scenes
    Scenes,
    /// List the built-in actions
    Actions,
    /// Run a character through a scene for a number of ticks
    Simulate {
        #[arg(long, default_value = "neutral")]
        archetype: Archetype,
        #[arg(long)]
        scene: Option<String>,
        #[arg(long, default_value_t = 10)]
        ticks: u32,
        /// Overrides `rng_seed` from the config
        #[arg(long)]
        seed: Option<u64>,
        /// Action performed every tick at full intensity (repeatable)
        #[arg(long = "action")]
        actions: Vec<String>,
        /// Stimulus processed every tick, as `name` or `name:intensity` (repeatable)
        #[arg(long = "stimulus")]
        stimuli: Vec<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed file to start from
        #[arg(long)]
        load: Option<PathBuf>,
        /// Where to write the seed file after the run
        #[arg(long)]
        save: Option<PathBuf>,
        /// Print the final status as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },
    /// Print the dominant traits of a saved seed file
    Review {
        path: PathBuf,
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dharma_core=info,dharma=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Factors => {
            let catalog = FactorCatalog::builtin();
            for def in catalog.iter() {
                let antidote = def.antidote.as_deref().unwrap_or("-");
                println!(
                    "{:<16} {:<24} {:<20} antidote: {}",
                    def.id,
                    def.name,
                    def.category.label(),
                    antidote
                );
            }
        }
        Commands::Scenes => {
            for scene in SceneLibrary::builtin().iter() {
                println!(
                    "{:<16} {:<18} valence {:+.1}  {}",
                    scene.id, scene.title, scene.valence, scene.description
                );
            }
        }
        Commands::Actions => {
            for action in ActionTable::builtin().iter() {
                let counters = if action.counterforce_targets.is_empty() {
                    "-".to_string()
                } else {
                    action.counterforce_targets.join(", ")
                };
                println!("{:<16} {:<18} counters: {}", action.id, action.title, counters);
            }
        }
        Commands::Simulate {
            archetype,
            scene,
            ticks,
            seed,
            actions,
            stimuli,
            config,
            load,
            save,
            json,
        } => {
            let mut config = EngineConfig::load_layered(None, config.as_deref())?;
            if let Some(seed) = seed {
                config.rng_seed = seed;
            }

            let scenes = SceneLibrary::builtin();
            let scene = match scene {
                Some(id) => Some(
                    scenes
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| format!("unknown scene: {}", id))?,
                ),
                None => None,
            };
            let stimuli = stimuli
                .iter()
                .map(|s| parse_stimulus(s))
                .collect::<Result<Vec<_>, _>>()?;

            let mut engine = ManifestationEngine::from_archetype(archetype, config);
            if let Some(path) = &load {
                engine.load_seeds(path)?;
            }
            engine.set_scene(scene.clone());
            tracing::info!(
                archetype = %archetype,
                scene = scene.as_ref().map(|s| s.id.as_str()).unwrap_or("none"),
                ticks,
                "starting simulation"
            );

            for _ in 0..ticks {
                let state = engine.update_manifest(scene.as_ref());
                let line = format!(
                    "t={:<4} wholesome={:<2} afflictions={:<2} valence={:+.3} patterns=[{}]",
                    state.timestamp,
                    state.wholesome.len(),
                    state.afflictions.len(),
                    state.net_valence(),
                    state.patterns.join(", ")
                );
                if !json {
                    println!("{}", line);
                }
                for action in &actions {
                    engine.perform_action(action, 1.0)?;
                }
                for (stimulus, intensity) in &stimuli {
                    let event = engine.process_stimulus(stimulus, *intensity);
                    tracing::debug!("{}", event.to_log());
                }
                engine.tick();
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&engine.status())?);
            } else {
                println!();
                println!("{}", engine.review());
            }

            if let Some(path) = &save {
                engine.save_seeds(path)?;
                tracing::info!(path = %path.display(), "seeds saved");
            }
        }
        Commands::Review { path, top } => {
            let catalog = Arc::new(FactorCatalog::builtin());
            let store = TraitStore::load(&path, Arc::clone(&catalog), Default::default())?;

            println!("Seed bank at t={}", store.current_time());
            println!("[Dominant afflictions]");
            for (id, weight) in store.dominant_afflictions(top) {
                println!("  {:<24} {:.3}", display_name(&catalog, &id), weight);
            }
            println!("[Dominant wholesome]");
            for (id, weight) in store.dominant_wholesome(top) {
                println!("  {:<24} {:.3}", display_name(&catalog, &id), weight);
            }
        }
    }
    Ok(())
}

fn parse_stimulus(raw: &str) -> Result<(String, f64), String> {
    match raw.split_once(':') {
        Some((name, intensity)) => {
            let intensity: f64 = intensity
                .parse()
                .map_err(|_| format!("bad stimulus intensity in '{}'", raw))?;
            Ok((name.to_string(), intensity))
        }
        None => Ok((raw.to_string(), 1.0)),
    }
}

fn display_name<'a>(catalog: &'a FactorCatalog, id: &'a str) -> &'a str {
    catalog.get(id).map(|d| d.name.as_str()).unwrap_or(id)
}
