fn main() {
    if let Err(err) = uml_class_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
