//
// Copyright (c) 2025 Nathan Fiedler
//
use sqrtarray::ExtendibleArray;
use std::time::Instant;

//
// Compares the time to fill, read, and drain an extendible array against a
// vector. The extendible array is expected to be slower, the interesting part
// is how much slower given the savings in unused capacity.
//

fn create_extarray(size: u64) {
    let start = Instant::now();
    let mut coll: ExtendibleArray<u64> = ExtendibleArray::new();
    for value in 0..size {
        coll.push(value);
    }
    let filled = start.elapsed();
    let mut sum: u64 = 0;
    for index in 0..coll.len() {
        sum = sum.wrapping_add(coll[index]);
    }
    let read = start.elapsed() - filled;
    println!(
        "extarray: fill {:?}, read {:?}, slack {} slots, sum {}",
        filled,
        read,
        coll.capacity() - coll.len(),
        sum
    );
    let start = Instant::now();
    while coll.pop().is_some() {}
    println!("extarray: drain {:?}", start.elapsed());
}

fn create_vector(size: u64) {
    let start = Instant::now();
    let mut coll: Vec<u64> = Vec::new();
    for value in 0..size {
        coll.push(value);
    }
    let filled = start.elapsed();
    let mut sum: u64 = 0;
    for index in 0..coll.len() {
        sum = sum.wrapping_add(coll[index]);
    }
    let read = start.elapsed() - filled;
    println!(
        "vector: fill {:?}, read {:?}, slack {} slots, sum {}",
        filled,
        read,
        coll.capacity() - coll.len(),
        sum
    );
    let start = Instant::now();
    while coll.pop().is_some() {}
    println!("vector: drain {:?}", start.elapsed());
}

fn main() {
    println!("creating ExtendibleArray...");
    create_extarray(100_000_000);
    println!("creating Vec...");
    create_vector(100_000_000);
}
