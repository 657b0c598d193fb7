/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

use criterion::{Criterion, criterion_group, criterion_main};


criterion_group!(benches, run_benchmarks);
criterion_main!(benches);

fn run_benchmarks(c: &mut Criterion) {
    dispatch_bench::register_benchmarks(c);
}
