use std::env;
use std::error::Error;
use std::path::Path;
use std::process;
use std::sync::Arc;

use hive_router_composer_config::{
    federation::FederationFieldConfig, load_config, DataSourceConfig,
};
use hive_router_fetch_composer::compose_fetch;
use hive_router_fetch_composer::configuration::{
    DataSourceConfiguration, DataSourcePlannerConfiguration, PathType,
};
use hive_router_fetch_composer::planner::PlannerFactory;
use hive_router_fetch_composer::representation::{RepresentationBuilder, RepresentationNode};
use hive_router_fetch_composer::schema::SchemaIndex;
use hive_router_fetch_composer::utils::parsing::{parse_operation, parse_schema};
use hive_router_fetch_composer::utils::pretty_display::PrettyDisplay;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: fetch-composer-dev <command> <config_path> [...]

Commands:
  plan <config> <client_schema> <operation> [--parent-path <path>] [--array]
       [--key <Type>=<field set>]... [--json]
  subscription <config> <client_schema> <operation>
  representation <config> <client_schema> <Type> <field set>
  validation_schema <config>
  schema";

fn main() {
    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_bracketed_fields(true)
        .with_deferred_spans(false)
        .with_wraparound(25)
        .with_indent_lines(true)
        .with_timer(tracing_tree::time::Uptime::default())
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_targets(false);

    tracing_subscriber::registry()
        .with(tree_layer)
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    if let Err(err) = run(&args) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    match args[1].as_str() {
        "plan" => {
            let [config_path, schema_path, operation_path] = positional::<3>(args)?;
            let factory = load_factory(config_path)?;
            let definition = load_client_schema(schema_path)?;
            let operation = parse_operation(&std::fs::read_to_string(operation_path)?)?;

            let fetch = compose_fetch(
                &factory,
                &definition,
                &operation,
                None,
                planner_configuration(args)?,
            )?;
            if args.contains(&"--json".into()) {
                println!("{}", serde_json::to_string_pretty(&fetch)?);
            } else {
                println!("{}", fetch.pretty());
                if let Some(template) = &fetch.representation {
                    println!("representations: {}", template.pretty());
                }
            }
        }
        "subscription" => {
            let [config_path, schema_path, operation_path] = positional::<3>(args)?;
            let factory = load_factory(config_path)?;
            let definition = load_client_schema(schema_path)?;
            let operation = parse_operation(&std::fs::read_to_string(operation_path)?)?;

            let mut planner = factory.planner(DataSourcePlannerConfiguration {
                parent_path: "subscription".to_string(),
                ..Default::default()
            });
            planner.plan(&definition, &operation, None)?;
            let subscription = planner.configure_subscription()?;
            println!("{}", subscription.input);
        }
        "representation" => {
            let [config_path, schema_path, type_name, field_set] = positional::<4>(args)?;
            let factory = load_factory(config_path)?;
            let definition = load_client_schema(schema_path)?;

            let builder =
                RepresentationBuilder::new(&definition, &factory.configuration().federation);
            let node = builder.build_for(type_name, field_set)?;
            println!("{}", RepresentationNode::Object(node).pretty());
        }
        "validation_schema" => {
            let [config_path] = positional::<1>(args)?;
            let factory = load_factory(config_path)?;
            println!("{}", factory.configuration().validation_schema);
        }
        "schema" => {
            let schema = schemars::schema_for!(DataSourceConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        _ => {
            return Err(format!("Unknown command.\n\n{}", USAGE).into());
        }
    };

    Ok(())
}

/// The first `N` arguments after the command.
fn positional<const N: usize>(args: &[String]) -> Result<[&str; N], Box<dyn Error>> {
    let values = args
        .iter()
        .skip(2)
        .take_while(|arg| !arg.starts_with("--"))
        .map(String::as_str)
        .collect::<Vec<_>>();

    values
        .get(..N)
        .and_then(|values| <[&str; N]>::try_from(values).ok())
        .ok_or_else(|| format!("Expected {} arguments.\n\n{}", N, USAGE).into())
}

fn flag_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].as_str())
        .collect()
}

fn planner_configuration(args: &[String]) -> Result<DataSourcePlannerConfiguration, String> {
    let mut configuration = DataSourcePlannerConfiguration::default();

    if let Some(parent_path) = flag_values(args, "--parent-path").first() {
        configuration.parent_path = parent_path.to_string();
        configuration.is_nested = configuration.parent_path.contains('.');
    }
    if args.contains(&"--array".into()) {
        configuration.path_type = PathType::ArrayItem;
    }

    for key in flag_values(args, "--key") {
        let (type_name, field_set) = key
            .split_once('=')
            .ok_or_else(|| format!("Invalid key '{}', expected <Type>=<field set>", key))?;
        configuration.required_fields.push(FederationFieldConfig {
            type_name: type_name.to_string(),
            selection_set: field_set.to_string(),
            ..Default::default()
        });
    }

    if configuration.is_nested {
        configuration.fetch_id = 1;
        configuration.depends_on_fetch_ids = vec![0];
    }

    Ok(configuration)
}

fn load_factory(config_path: &str) -> Result<PlannerFactory, Box<dyn Error>> {
    let config_path = Path::new(config_path);
    let config = load_config(config_path)?;
    let root_directory = config_path.parent().unwrap_or(Path::new("."));
    let configuration = DataSourceConfiguration::load(config, root_directory)?;

    Ok(PlannerFactory::new(Arc::new(configuration)))
}

fn load_client_schema(schema_path: &str) -> Result<SchemaIndex, Box<dyn Error>> {
    let sdl = std::fs::read_to_string(schema_path)?;
    Ok(SchemaIndex::new(&parse_schema(&sdl)?))
}
