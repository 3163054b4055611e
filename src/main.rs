#[macro_use]
extern crate log;
extern crate env_logger;

use std::process;

use clap::{arg, crate_version, value_parser, ArgMatches, Command};
use log::LevelFilter;
use regex::Regex;

use spreedly::{change_subscription_url, subscribe_url};
use spreedly::{Config, Decimal, Error, Fields, Resource, Result, Scalar, Spreedly, Value};

fn cli() -> Command {
    Command::new("spreedly")
        .version(crate_version!())
        .author("Damien Lecan <dev@dlecan.com>")
        .about("Manage Spreedly subscribers and plans from the command line")
        .subcommand_required(true)
        .arg(arg!(-t --token <TOKEN> "Your API token provided by Spreedly")
            .env("SPREEDLY_TOKEN")
            .hide_env_values(true))
        .arg(arg!(-s --site <SITE> "The short name of your Spreedly site, e.g. \"mysite-test\"")
            .env("SPREEDLY_SITE_NAME"))
        .arg(arg!(--host <HOST> "API host, only useful against a local stub").env("SPREEDLY_HOST"))
        .arg(arg!(--"allow-destructive" "Really delete subscribers on delete and cleanup"))
        .arg(arg!(--"local-time" "Show datetimes in the local timezone instead of UTC"))
        .arg(arg!(-v --verbose ... "Verbose mode, repeat for request bodies"))
        .subcommand(Command::new("plans").about("List subscription plans"))
        .subcommand(Command::new("get")
            .about("Show a subscriber")
            .arg(arg!(<ID> "Subscriber (customer) id")))
        .subcommand(Command::new("create")
            .about("Create a subscriber")
            .arg(arg!(<CUSTOMER_ID> "Customer id of the new subscriber"))
            .arg(arg!([FIELD] ... "Field assignment: name=value or name:kind=value")))
        .subcommand(Command::new("update")
            .about("Update a subscriber")
            .arg(arg!(<ID> "Subscriber (customer) id"))
            .arg(arg!([FIELD] ... "Field assignment: name=value or name:kind=value")))
        .subcommand(Command::new("trial")
            .about("Subscribe to a free trial plan")
            .arg(arg!(<ID> "Subscriber (customer) id"))
            .arg(arg!(<PLAN_ID> "Id of the trial plan").value_parser(value_parser!(i64))))
        .subcommand(Command::new("lifetime")
            .about("Give a complimentary lifetime subscription")
            .arg(arg!(<ID> "Subscriber (customer) id"))
            .arg(arg!(<FEATURE_LEVEL> "Feature level of the subscription")))
        .subcommand(Command::new("allow-trial")
            .about("Make a subscriber eligible for another free trial")
            .arg(arg!(<ID> "Subscriber (customer) id")))
        .subcommand(Command::new("delete")
            .about("Delete a subscriber (needs --allow-destructive)")
            .arg(arg!(<ID> "Subscriber (customer) id")))
        .subcommand(Command::new("cleanup")
            .about("Delete ALL subscribers (needs --allow-destructive)"))
        .subcommand(Command::new("subscribe-url")
            .about("Print the hosted subscription page URL")
            .arg(arg!(<CUSTOMER_ID> "Customer id of the subscriber"))
            .arg(arg!(<SUBSCRIBER_TOKEN> "Token of the subscriber, as returned by the API"))
            .arg(arg!(<PLAN_ID> "Id of the plan").value_parser(value_parser!(i64)))
            .arg(arg!(<RETURN_URL> "Where to send the subscriber afterwards")))
        .subcommand(Command::new("manage-url")
            .about("Print the hosted account management page URL")
            .arg(arg!(<SUBSCRIBER_TOKEN> "Token of the subscriber, as returned by the API"))
            .arg(arg!(<RETURN_URL> "Where to send the subscriber afterwards")))
}

fn main() {
    let matches = cli().get_matches();

    // RUST_LOG applies unless -v is given
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match matches.get_count("verbose") {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();

    if let Err(err) = run(&matches) {
        eprintln!("spreedly: {}", err);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    // Hosted page URLs need no API access
    match matches.subcommand() {
        Some(("subscribe-url", sub)) => {
            let url = subscribe_url(
                required(matches, "site")?,
                required(sub, "CUSTOMER_ID")?,
                required(sub, "SUBSCRIBER_TOKEN")?,
                plan_id(sub)?,
                required(sub, "RETURN_URL")?,
            );
            println!("{}", url);
            return Ok(());
        }
        Some(("manage-url", sub)) => {
            let url = change_subscription_url(
                required(matches, "site")?,
                required(sub, "SUBSCRIBER_TOKEN")?,
                required(sub, "RETURN_URL")?,
            );
            println!("{}", url);
            return Ok(());
        }
        _ => {}
    }

    let config = build_config(matches)?;
    debug!("Using site: {}", config.site_name);
    debug!("Destructive operations allowed: {}", config.allow_destructive_operations);

    let client = Spreedly::new(&config);

    match matches.subcommand() {
        Some(("plans", _)) => {
            for plan in client.get_plans()? {
                print_value(&plan, 0);
                println!();
            }
        }
        Some(("get", sub)) => print_resource(&client.get_subscriber(required(sub, "ID")?)?, 0),
        Some(("create", sub)) => {
            let fields = parse_fields(sub)?;
            print_resource(&client.create_subscriber(required(sub, "CUSTOMER_ID")?, fields)?, 0)
        }
        Some(("update", sub)) => {
            let fields = parse_fields(sub)?;
            client.update_subscriber(required(sub, "ID")?, fields)?
        }
        Some(("trial", sub)) => {
            print_resource(&client.subscribe_to_trial(required(sub, "ID")?, plan_id(sub)?)?, 0)
        }
        Some(("lifetime", sub)) => {
            let subscription =
                client.subscribe_to_lifetime_plan(required(sub, "ID")?, required(sub, "FEATURE_LEVEL")?)?;
            print_resource(&subscription, 0)
        }
        Some(("allow-trial", sub)) => {
            print_resource(&client.allow_another_trial(required(sub, "ID")?)?, 0)
        }
        Some(("delete", sub)) => client.delete_subscriber(required(sub, "ID")?)?,
        Some(("cleanup", _)) => client.delete_all_subscribers()?,
        Some((name, _)) => return Err(Error::Config(format!("unknown command '{}'", name))),
        None => return Err(Error::Config("no command given".to_string())),
    }

    Ok(())
}

fn build_config(matches: &ArgMatches) -> Result<Config> {
    let token = matches.get_one::<String>("token")
        .ok_or_else(|| Error::Config("missing API token (--token or SPREEDLY_TOKEN)".to_string()))?;

    let mut config = Config::new(token, required(matches, "site")?)
        .with_destructive_operations(matches.get_flag("allow-destructive"));

    if let Some(host) = matches.get_one::<String>("host") {
        config = config.with_host(host);
    }
    if matches.get_flag("local-time") {
        config = config.with_local_offset()?;
    }

    Ok(config)
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches.get_one::<String>(id)
        .map(|s| s.as_str())
        .ok_or_else(|| Error::Config(format!("missing argument {}", id)))
}

fn plan_id(matches: &ArgMatches) -> Result<i64> {
    matches.get_one::<i64>("PLAN_ID")
        .cloned()
        .ok_or_else(|| Error::Config("missing argument PLAN_ID".to_string()))
}

fn parse_fields(matches: &ArgMatches) -> Result<Fields> {
    let regex = Regex::new(r"^(?P<name>[A-Za-z][A-Za-z0-9_]*)(?::(?P<kind>[a-z]+))?=(?P<value>.*)$")
        .map_err(|err| Error::Config(err.to_string()))?;

    let mut fields = Fields::new();
    if let Some(assignments) = matches.get_many::<String>("FIELD") {
        for assignment in assignments {
            let (name, value) = parse_field(&regex, assignment)?;
            fields.insert(&name, value);
        }
    }
    Ok(fields)
}

fn parse_field(regex: &Regex, assignment: &str) -> Result<(String, Scalar)> {
    let invalid = || Error::InvalidValue {
        kind: "field assignment",
        text: assignment.to_string(),
    };

    let caps = regex.captures(assignment).ok_or_else(invalid)?;
    let name = caps["name"].to_string();
    let value = &caps["value"];

    let scalar = match caps.name("kind").map(|kind| kind.as_str()) {
        None | Some("string") => Scalar::from(value),
        Some("integer") => Scalar::Integer(value.parse().map_err(|_| invalid())?),
        Some("decimal") => Scalar::Decimal(value.parse::<Decimal>()?),
        Some("boolean") => {
            match value {
                "true" => Scalar::Boolean(true),
                "false" => Scalar::Boolean(false),
                _ => return Err(invalid()),
            }
        }
        Some("null") => Scalar::Null,
        Some(_) => return Err(invalid()),
    };

    Ok((name, scalar))
}

fn scalar_text(scalar: &Scalar) -> String {
    match *scalar {
        Scalar::Null => "null".to_string(),
        ref other => other.to_string(),
    }
}

fn print_resource(resource: &Resource, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, value) in resource.iter() {
        match *value {
            Value::Scalar(ref scalar) => println!("{}{} = {}", indent, key, scalar_text(scalar)),
            _ => {
                println!("{}{}:", indent, key);
                print_value(value, depth + 1);
            }
        }
    }
}

fn print_value(value: &Value, depth: usize) {
    match *value {
        Value::Scalar(ref scalar) => println!("{}{}", "  ".repeat(depth), scalar_text(scalar)),
        Value::Array(ref values) => {
            for (idx, item) in values.iter().enumerate() {
                println!("{}[{}]", "  ".repeat(depth), idx);
                print_value(item, depth + 1);
            }
        }
        Value::Resource(ref resource) => print_resource(resource, depth),
    }
}
