// Event dispatch and print protocol benchmarks
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chatline::events::{EventBus, EventKind};
use chatline::ui::{print, PrintOptions, PromptLine};
use chatline::Message;

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for handlers in [1usize, 8, 64].iter() {
        let bus: EventBus<()> = EventBus::new();
        for _ in 0..*handlers {
            bus.on(EventKind::MessageReceived, |_, m| {
                black_box(m.text().len());
                Ok(())
            });
        }
        let msg = Message::new("hello there").with_sender("bench");

        group.bench_with_input(BenchmarkId::from_parameter(handlers), handlers, |b, _| {
            b.iter(|| black_box(bus.emit(&(), EventKind::MessageReceived, &msg)))
        });
    }

    group.finish();
}

fn bench_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("print");

    for size in [16usize, 256, 4096].iter() {
        let mut line = PromptLine::new(Some(Box::new(std::io::sink())), "> ", true);
        for ch in "half typed".chars() {
            line.apply(chatline::ui::Key::Char(ch));
        }
        let text = "x".repeat(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| print(&mut line, black_box(&text), PrintOptions::default()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_emit, bench_print);
criterion_main!(benches);
