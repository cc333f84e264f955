//! Benchmarks for the autowiring container

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dependency_autowire::{
    Args, Binding, Constructor, Container, Parameter, TypeDescriptor, TypeRegistry,
};
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
struct SmallService {
    value: i32,
}

#[allow(dead_code)]
struct Layer {
    inner: Option<Arc<Layer>>,
}

/// `Layer0 -> Layer1 -> ... -> Layer{depth-1}`
fn layered_types(depth: usize) -> TypeRegistry {
    let types = TypeRegistry::new();
    for i in 0..depth {
        let constructor = if i + 1 < depth {
            Constructor::new(|deps| {
                Ok(Layer {
                    inner: Some(deps.get::<Layer>(0)?),
                })
            })
            .param(Parameter::dependency("inner", format!("Layer{}", i + 1)))
        } else {
            Constructor::new(|_| Ok(Layer { inner: None }))
        };
        types.register(TypeDescriptor::concrete(format!("Layer{i}")).with_constructor(constructor));
    }
    types
}

fn small_types() -> TypeRegistry {
    let types = TypeRegistry::new();
    types.register(TypeDescriptor::interface("Small"));
    types.register(
        TypeDescriptor::concrete("SmallService").with_constructor(
            Constructor::new(|deps| {
                Ok(SmallService {
                    value: *deps.get::<i32>(0)?,
                })
            })
            .param(Parameter::primitive::<i32>("value").with_default(42i32)),
        ),
    );
    types
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("bind_alias", |b| {
        b.iter(|| {
            let container = Container::new(TypeRegistry::new());
            container.bind("Small", "SmallService");
            black_box(container)
        })
    });

    group.bench_function("bind_factory", |b| {
        b.iter(|| {
            let container = Container::new(TypeRegistry::new());
            container.bind("small", Binding::factory(|_| SmallService { value: 42 }));
            black_box(container)
        })
    });

    group.bench_function("singleton_instance", |b| {
        b.iter(|| {
            let container = Container::new(TypeRegistry::new());
            container.singleton("small", Binding::instance(SmallService { value: 42 }));
            black_box(container)
        })
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let args = Args::new();

    let container = Container::new(small_types());
    container.singleton("cached", "SmallService");
    container.bind("Small", "SmallService");
    container.bind("factory", Binding::factory(|_| SmallService { value: 1 }));
    container.bind("instance", Binding::instance(SmallService { value: 2 }));
    let _ = container.make("cached", &args);

    group.bench_function("singleton_cached", |b| {
        b.iter(|| black_box(container.make("cached", &args)))
    });

    group.bench_function("instance", |b| {
        b.iter(|| black_box(container.make("instance", &args)))
    });

    group.bench_function("factory", |b| {
        b.iter(|| black_box(container.make("factory", &args)))
    });

    group.bench_function("autowire_interface", |b| {
        b.iter(|| black_box(container.make("Small", &args)))
    });

    group.bench_function("get_typed", |b| {
        b.iter(|| black_box(container.get::<SmallService>("cached")))
    });

    group.finish();
}

fn bench_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("autowire_depth");
    let args = Args::new();

    for depth in [1usize, 4, 16, 64] {
        let container = Container::new(layered_types(depth));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(container.make("Layer0", &args)))
        });
    }

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");

    group.bench_function("concurrent_singleton_reads_4", |b| {
        let container = Container::new(small_types());
        container.singleton("small", "SmallService");

        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let c = container.clone();
                    thread::spawn(move || {
                        let args = Args::new();
                        for _ in 0..100 {
                            let _ = c.make("small", &args).unwrap();
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registration,
    bench_resolution,
    bench_depth,
    bench_concurrent,
);

criterion_main!(benches);
