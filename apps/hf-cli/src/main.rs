use clap::{Parser, Subcommand};
use hf_core::{ObjectId, parse_handle};
use hf_graph::{Model, ObjectKind, validate_model};
use hf_project::{ProjectError, export_model, import_project};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "HVACFlow CLI - HVAC loop topology editing tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, structure and topology
    Validate {
        /// Path to the project file (YAML, or JSON by extension)
        project_path: PathBuf,
    },
    /// List air and plant loops with their supply and demand chains
    Loops {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// List outdoor-air systems with their intake and relief chains
    OutdoorAir {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Write a small sample project
    Demo {
        /// Output project file
        output: PathBuf,
    },
    /// Create a component and splice it in at a node
    Insert {
        /// Path to the project file
        project_path: PathBuf,
        /// Component kind (e.g. fan, heating_coil, chiller)
        kind: String,
        /// Handle of the node to insert at
        node: String,
        /// Write the result here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove an object and repair the chain it sat on
    Remove {
        /// Path to the project file
        project_path: PathBuf,
        /// Handle of the object to remove
        handle: String,
        /// Write the result here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Graph(#[from] hf_graph::GraphError),

    #[error(transparent)]
    Core(#[from] hf_core::HfError),

    #[error("No object with handle {handle}")]
    UnknownHandle { handle: String },

    #[error("{what}")]
    Rejected { what: String },
}

type AppResult<T> = Result<T, AppError>;

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Loops { project_path } => cmd_loops(&project_path),
        Commands::OutdoorAir { project_path } => cmd_outdoor_air(&project_path),
        Commands::Demo { output } => cmd_demo(&output),
        Commands::Insert {
            project_path,
            kind,
            node,
            output,
        } => cmd_insert(&project_path, &kind, &node, output.as_deref()),
        Commands::Remove {
            project_path,
            handle,
            output,
        } => cmd_remove(&project_path, &handle, output.as_deref()),
    }
}

fn open_model(project_path: &Path) -> AppResult<(String, Model)> {
    let project = hf_project::load(project_path)?;
    let model = import_project(&project)?;
    Ok((project.name, model))
}

fn save_model(path: &Path, name: &str, model: &Model) -> AppResult<()> {
    validate_model(model)?;
    hf_project::save(path, &export_model(model, name))?;
    Ok(())
}

fn find(model: &Model, handle: &str) -> AppResult<ObjectId> {
    model
        .object_by_handle(parse_handle(handle)?)
        .ok_or_else(|| AppError::UnknownHandle {
            handle: handle.to_string(),
        })
}

fn describe(model: &Model, obj: ObjectId) -> String {
    match (model.name(obj), model.kind(obj)) {
        (Some(name), Some(kind)) => format!("{} [{}]", name, kind.label()),
        _ => obj.to_string(),
    }
}

fn print_chain(label: &str, model: &Model, chain: &[ObjectId]) {
    println!("    {} ({}):", label, chain.len());
    for &obj in chain {
        println!("      {}", describe(model, obj));
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let (_, model) = open_model(project_path)?;
    validate_model(&model)?;
    println!(
        "✓ Project is valid ({} objects, {} connections)",
        model.object_count(),
        model.edges().len()
    );
    Ok(())
}

fn cmd_loops(project_path: &Path) -> AppResult<()> {
    let (_, model) = open_model(project_path)?;
    let loops: Vec<ObjectId> = model
        .air_loops()
        .into_iter()
        .chain(model.plant_loops())
        .collect();

    if loops.is_empty() {
        println!("No loops found in project");
        return Ok(());
    }
    println!("Loops in project:");
    for loop_id in loops {
        println!("  {}", describe(&model, loop_id));
        print_chain("supply", &model, &model.supply_components(loop_id));
        print_chain("demand", &model, &model.demand_components(loop_id));
        if let Some(system) = model.loop_outdoor_air_system(loop_id) {
            println!("    outdoor air: {}", describe(&model, system));
        }
    }
    Ok(())
}

fn cmd_outdoor_air(project_path: &Path) -> AppResult<()> {
    let (_, model) = open_model(project_path)?;
    let systems = model.outdoor_air_systems();

    if systems.is_empty() {
        println!("No outdoor-air systems found in project");
        return Ok(());
    }
    println!("Outdoor-air systems in project:");
    for system in systems {
        let on = model
            .air_loop(system)
            .map(|l| describe(&model, l))
            .unwrap_or_else(|| "unattached".to_string());
        println!("  {} on {}", describe(&model, system), on);
        print_chain("intake", &model, &model.oa_components(system));
        print_chain("relief", &model, &model.relief_components(system));
    }
    Ok(())
}

fn cmd_demo(output: &Path) -> AppResult<()> {
    let mut model = Model::new();

    let air_loop = model.add_air_loop()?;
    let system = model.add_outdoor_air_system()?;
    let hx = model.add_component(ObjectKind::HeatExchangerAirToAir);
    let coil = model.add_component(ObjectKind::CoolingCoil);
    let fan = model.add_component(ObjectKind::Fan);
    let supply_inlet = required(model.supply_inlet_node(air_loop), "air loop supply inlet")?;
    splice(&mut model, system, supply_inlet)?;
    let outboard = required(model.outboard_oa_node(system), "outboard outdoor-air node")?;
    splice(&mut model, hx, outboard)?;
    let supply_outlet = required(model.supply_outlet_node(air_loop), "air loop supply outlet")?;
    splice(&mut model, coil, supply_outlet)?;
    splice(&mut model, fan, supply_outlet)?;

    let chilled = model.add_plant_loop()?;
    let condenser = model.add_plant_loop()?;
    let chiller = model.add_component(ObjectKind::Chiller);
    let pump = model.add_component(ObjectKind::Pump);
    let plant_inlet = required(model.supply_inlet_node(chilled), "plant supply inlet")?;
    splice(&mut model, pump, plant_inlet)?;
    if !model.add_supply_branch_for_component(chilled, chiller)?
        || !model.add_demand_branch_for_component(condenser, chiller, false)?
    {
        return Err(AppError::Rejected {
            what: "chiller branch was refused".to_string(),
        });
    }

    save_model(output, "Demo", &model)?;
    println!(
        "✓ Wrote demo project to {} ({} objects)",
        output.display(),
        model.object_count()
    );
    Ok(())
}

fn required(obj: Option<ObjectId>, what: &str) -> AppResult<ObjectId> {
    obj.ok_or_else(|| AppError::Rejected {
        what: format!("missing {what}"),
    })
}

fn splice(model: &mut Model, comp: ObjectId, node: ObjectId) -> AppResult<()> {
    if model.add_to_node(comp, node)? {
        Ok(())
    } else {
        Err(AppError::Rejected {
            what: format!(
                "{} cannot go at {}",
                describe(model, comp),
                describe(model, node)
            ),
        })
    }
}

fn cmd_insert(project_path: &Path, kind: &str, node: &str, output: Option<&Path>) -> AppResult<()> {
    let (name, mut model) = open_model(project_path)?;
    let kind = ObjectKind::from_str(kind)?;
    let node = find(&model, node)?;

    let comp = match kind {
        ObjectKind::OutdoorAirSystem => model.add_outdoor_air_system()?,
        _ => model.add_component(kind),
    };
    splice(&mut model, comp, node)?;

    let path = output.unwrap_or(project_path);
    save_model(path, &name, &model)?;
    let handle = model
        .handle(comp)
        .map(|h| h.to_string())
        .unwrap_or_default();
    println!("✓ Inserted {} ({})", describe(&model, comp), handle);
    Ok(())
}

fn cmd_remove(project_path: &Path, handle: &str, output: Option<&Path>) -> AppResult<()> {
    let (name, mut model) = open_model(project_path)?;
    let obj = find(&model, handle)?;
    let label = describe(&model, obj);

    if !model.is_removable(obj) {
        return Err(AppError::Rejected {
            what: format!("{} cannot be removed", label),
        });
    }
    let removed = model.remove(obj)?;

    let path = output.unwrap_or(project_path);
    save_model(path, &name, &model)?;
    println!("✓ Removed {} ({} objects gone)", label, removed.len());
    Ok(())
}
