use fibre_autowire::{global, resolve, Error};
use std::panic;

fn main() {
  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve an entry that was never registered...");

  let result = panic::catch_unwind(|| {
    // This line will panic!
    let _entry = resolve!("UnregisteredService");
  });

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the fallible `make()` method ---
  println!("\nNow, attempting to resolve using the fallible `make()` method...");

  match global().make("UnregisteredService") {
    Ok(_) => panic!("Should not have found the entry!"),
    Err(Error::EntryNotFound(id)) => println!("Correctly received `EntryNotFound` for '{}'.", id),
    Err(other) => panic!("Unexpected error: {}", other),
  }
}
