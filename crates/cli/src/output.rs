// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable rendering of daemon responses. Kept deliberately plain
//! (no color, no table alignment library) — the CLI is a thin control
//! surface, not the TUI spec §1 excludes from scope.

use brummer_core::{Coder, InstanceRecord};

pub fn print_coder(coder: &Coder) {
    println!(
        "{}  {:<10} {:<10} {:>5.0}%  {}",
        coder.id,
        coder.provider,
        format!("{:?}", coder.state).to_lowercase(),
        coder.progress * 100.0,
        coder.name
    );
}

pub fn print_coders(coders: &[Coder]) {
    if coders.is_empty() {
        println!("no coders");
        return;
    }
    for coder in coders {
        print_coder(coder);
    }
}

pub fn print_instances(instances: &[InstanceRecord]) {
    if instances.is_empty() {
        println!("no instances discovered");
        return;
    }
    for instance in instances {
        println!(
            "{}  {:<20} port={:<6} pid={:<8} {}",
            instance.id, instance.name, instance.port, instance.process_info.pid, instance.directory
        );
    }
}
