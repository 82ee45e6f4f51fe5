use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use stmd::{HtmlRenderer, markdown_to_html, parse};

fn gen_headings(n: usize) -> String {
    (1..=n)
        .map(|i| match i % 3 {
            0 => format!("Setext {i}\n------\n\nBody of section {i}.\n\n"),
            _ => format!("{} Section {i} ##\n\nBody of section {i}.\n\n", "#".repeat(i % 6 + 1)),
        })
        .collect()
}

fn gen_list_ladder(depth: usize) -> String {
    let mut s = String::new();
    let mut column = 0;
    for level in 0..depth {
        let marker = if level % 2 == 0 { "-" } else { "1." };
        s.push_str(&format!("{}{marker} level {level}\n", " ".repeat(column)));
        column += marker.len() + 1;
    }
    s
}

fn gen_blockquotes(n: usize) -> String {
    (0..n)
        .map(|i| format!("> quoted line {i}\nlazy continuation {i}\n>\n> - nested item\n\n"))
        .collect()
}

fn gen_code_blocks(n: usize) -> String {
    (0..n)
        .map(|i| format!("```rust\nfn func_{i}() {{\n    println!(\"hello\");\n}}\n```\n\n    indented {i}\n\n"))
        .collect()
}

fn gen_inline_heavy() -> String {
    (0..200)
        .map(|i| {
            format!(
                "Line {i} mixes **strong**, _em_, ***both***, `code`, [a link](/x/{i} \"t\"),\n<http://auto.link/{i}>, &amp; and \\*escapes\\*.\n\n"
            )
        })
        .collect()
}

fn gen_references(n: usize) -> String {
    let mut s = String::new();
    for i in 0..n {
        s.push_str(&format!("See [ref {i}] and [text][ref {i}].\n\n"));
    }
    for i in 0..n {
        s.push_str(&format!("[ref {i}]: /target/{i} \"Title {i}\"\n"));
    }
    s
}

fn gen_pathological() -> String {
    let mut s = "[".repeat(5_000);
    s.push_str(&"*a ".repeat(5_000));
    s
}

fn bench_group(c: &mut Criterion, name: &str, input: &str) {
    let label = format!("{}B", input.len());
    let mut group = c.benchmark_group(name);
    group.bench_with_input(BenchmarkId::new("parse", &label), input, |b, input| {
        b.iter(|| parse(black_box(input)))
    });
    let doc = parse(input);
    let renderer = HtmlRenderer::default();
    group.bench_with_input(BenchmarkId::new("render", &label), &doc, |b, doc| {
        b.iter(|| renderer.render(black_box(doc)))
    });
    group.bench_with_input(BenchmarkId::new("to_html", &label), input, |b, input| {
        b.iter(|| markdown_to_html(black_box(input)))
    });
    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let unit = format!("{}{}", gen_inline_heavy(), gen_blockquotes(20));
    for copies in [1, 10, 50] {
        let input = unit.repeat(copies);
        bench_group(c, &format!("scaling/x{copies}"), &input);
    }
}

fn bench_block_types(c: &mut Criterion) {
    let cases: Vec<(&str, String)> = vec![
        ("headings", gen_headings(200)),
        ("nested_lists", gen_list_ladder(50)),
        ("blockquotes", gen_blockquotes(100)),
        ("code_blocks", gen_code_blocks(100)),
    ];
    for (name, input) in &cases {
        bench_group(c, &format!("blocks/{name}"), input);
    }
}

fn bench_inline(c: &mut Criterion) {
    bench_group(c, "inline_heavy", &gen_inline_heavy());
    bench_group(c, "references", &gen_references(200));
    bench_group(c, "pathological", &gen_pathological());
}

criterion_group!(benches, bench_scaling, bench_block_types, bench_inline);
criterion_main!(benches);
