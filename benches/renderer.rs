use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use uml_class_renderer::config::LayoutConfig;
use uml_class_renderer::layout::compute_layout;
use uml_class_renderer::model::{ClassModel, ClassNode, Member, Relationship, RelationshipLink};
use uml_class_renderer::render::render_svg;
use uml_class_renderer::theme::Theme;

/// A wide class hierarchy: one root per 10 classes, the rest subclasses,
/// every class carrying a few members.
fn synthetic_model(classes: usize) -> ClassModel {
    let mut model = ClassModel::default();
    for index in 0..classes {
        let key = index as i64;
        let mut node = ClassNode::new(key, &format!("Class{index}"));
        for member in 0..3 {
            let mut method = Member::named(&format!("method{member}"));
            method.member_type = Some("void".to_string());
            node.methods.push(method);
        }
        model.nodes.push(node);
        if index % 10 != 0 {
            model.links.push(RelationshipLink {
                from: key,
                to: (index - index % 10) as i64,
                relationship: Relationship::Generalization,
            });
        }
    }
    model
}

fn bench_layout(c: &mut Criterion) {
    let theme = Theme::classic();
    let config = LayoutConfig::default();

    let sample = ClassModel::sample();
    c.bench_function("layout_sample", |b| {
        b.iter(|| compute_layout(black_box(&sample), &theme, &config))
    });

    let mut group = c.benchmark_group("layout_synthetic");
    for classes in [20usize, 60, 120] {
        let model = synthetic_model(classes);
        group.bench_with_input(BenchmarkId::from_parameter(classes), &model, |b, model| {
            b.iter(|| compute_layout(black_box(model), &theme, &config))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let theme = Theme::classic();
    let config = LayoutConfig::default();
    let model = synthetic_model(60);
    let layout = compute_layout(&model, &theme, &config);

    c.bench_function("render_svg_60_classes", |b| {
        b.iter(|| render_svg(black_box(&layout), &theme, &config))
    });
}

criterion_group!(benches, bench_layout, bench_render);
criterion_main!(benches);
