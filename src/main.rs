fn main() {
    if let Err(err) = service_graph_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
