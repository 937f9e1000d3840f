//! Offline views: mapping table and key spec compiler

use midi2hid::{Config, KeySpec, NoteMap};
use midi2hid_keys::key_name;

pub fn mapping(config: &Config) {
    print!("{}", NoteMap::build(&config.mapping).render_tree());
}

pub fn compile(spec: &str) {
    let spec = KeySpec::new(spec);
    let report = spec.compile_report();
    let names: Vec<&str> = report.keys().map(key_name).collect();
    println!("Keys:      {spec}");
    println!("Modifiers: {:#04x}", report.modifiers());
    println!("Pressed:   {}", names.join(" "));
    println!("Report:    {report}");
}
