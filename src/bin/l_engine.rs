//! CLI for the linear K_k clique-minor finder.

use std::fs::File;
use std::io::BufReader;

use clap::{crate_version, App, Arg};

fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));
	let matches = App::new("l-engine")
		.version(crate_version!())
		.about("Enumerates linear K_k clique minors of a main-strand graph")
		.arg(Arg::with_name("input-file").long("input-file").short("i").takes_value(true).required(true).help("NODE/EDGE graph file"))
		.arg(Arg::with_name("output-file").long("output-file").short("o").takes_value(true).required(true).help("Output MINOR records"))
		.arg(
			Arg::with_name("num-vertices")
				.long("num-vertices")
				.short("k")
				.takes_value(true)
				.required(true)
				.validator(|s| s.parse::<u32>().map(|_| ()).map_err(|e| e.to_string()))
				.help("Clique size k (3 <= k <= 8)"),
		)
		.arg(Arg::with_name("no-common-endpoints").long("no-common-endpoints").takes_value(false).help("Forbid two chosen jump edges from sharing an endpoint"))
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
	let output_path = matches.value_of("output-file").unwrap();
	let k: u32 = matches.value_of("num-vertices").unwrap().parse().expect("validated by clap");
	let allow_common_endpoints = !matches.is_present("no-common-endpoints");
	let frontier_limit: usize = matches.value_of("frontier-limit").unwrap().parse().expect("validated by clap");

	log::info!("reading graph from {}", input_path);
	let input = File::open(input_path).unwrap_or_else(|e| panic!("cannot open {}: {}", input_path, e));
	let g = minorfinder::io::read_graph(input_path, BufReader::new(input)).unwrap_or_else(|e| panic!("{}", e));
	log::info!("graph has {} nodes, {} edges", g.size(), g.edge_count());

	log::info!("searching for linear K_{} minors", k);
	let found = minorfinder::engine::linear::solve(&g, k, allow_common_endpoints, frontier_limit).unwrap_or_else(|e| panic!("{}", e));
	log::info!("found {} minors", found.len());

	let output = File::create(output_path).unwrap_or_else(|e| panic!("cannot create {}: {}", output_path, e));
	minorfinder::io::write_linear_minors(output, &g, &found)
}
