//! CLI for the generic path-decomposition minor finder.

use std::fs::File;
use std::io::BufReader;

use clap::{crate_version, App, Arg};
use minorfinder::engine::pminor::Params;

fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));
	let matches = App::new("p-engine")
		.version(crate_version!())
		.about("Enumerates minors of a graph given a bounded-width path decomposition")
		.arg(Arg::with_name("input-file").long("input-file").short("i").takes_value(true).required(true).help("NODE/EDGE graph file"))
		.arg(
			Arg::with_name("decomp-file")
				.long("decomp-file")
				.short("d")
				.takes_value(true)
				.required(true)
				.help("INTRODUCE_NODE/INTRODUCE_EDGE/FORGET_NODE path decomposition file"),
		)
		.arg(Arg::with_name("output-file").long("output-file").short("o").takes_value(true).required(true).help("Output MINOR records"))
		.arg(int_arg("max-n", "Maximum number of branches in an emitted minor"))
		.arg(int_arg("min-n", "Minimum number of branches in an emitted minor"))
		.arg(int_arg("max-cost", "Maximum number of minor-edges kept in any partial state"))
		.arg(int_arg("max-nonedges", "Maximum provable non-edges tolerated in an emitted minor"))
		.arg(int_arg("min-deg", "Minimum degree a forgotten branch must have to survive"))
		.arg(
			Arg::with_name("frontier-limit")
				.long("frontier-limit")
				.takes_value(true)
				.default_value("10000000")
				.validator(|s| s.parse::<usize>().map(|_| ()).map_err(|e| e.to_string()))
				.help("Abort once the partial-state frontier exceeds this many states"),
		)
		.get_matches();

	let input_path = matches.value_of("input-file").unwrap();
	let decomp_path = matches.value_of("decomp-file").unwrap();
	let output_path = matches.value_of("output-file").unwrap();
	let params = Params {
		max_n: parse_usize(&matches, "max-n"),
		min_n: parse_usize(&matches, "min-n"),
		max_cost: parse_usize(&matches, "max-cost"),
		max_nonedges: parse_usize(&matches, "max-nonedges"),
		min_deg: parse_usize(&matches, "min-deg"),
	};
	let frontier_limit: usize = matches.value_of("frontier-limit").unwrap().parse().expect("validated by clap");

	log::info!("reading graph from {}", input_path);
	let input = File::open(input_path).unwrap_or_else(|e| panic!("cannot open {}: {}", input_path, e));
	let g = minorfinder::io::read_graph(input_path, BufReader::new(input)).unwrap_or_else(|e| panic!("{}", e));

	log::info!("reading path decomposition from {}", decomp_path);
	let decomp_file = File::open(decomp_path).unwrap_or_else(|e| panic!("cannot open {}: {}", decomp_path, e));
	let pd = minorfinder::io::read_path_decomp(decomp_path, BufReader::new(decomp_file)).unwrap_or_else(|e| panic!("{}", e));
	log::info!("decomposition width {}", pd.width());

	log::info!("searching for minors");
	let found = minorfinder::engine::pminor::solve(&g, &pd, params, frontier_limit).unwrap_or_else(|e| panic!("{}", e));
	log::info!("found {} minors", found.len());

	let output = File::create(output_path).unwrap_or_else(|e| panic!("cannot create {}: {}", output_path, e));
	minorfinder::io::write_minors(output, &g, &found)
}

fn int_arg<'a, 'b>(name: &'a str, help: &'a str) -> Arg<'a, 'b> {
	Arg::with_name(name).long(name).takes_value(true).required(true).validator(|s| s.parse::<usize>().map(|_| ()).map_err(|e| e.to_string())).help(help)
}

fn parse_usize(matches: &clap::ArgMatches, name: &str) -> usize {
	matches.value_of(name).unwrap().parse().expect("validated by clap")
}
