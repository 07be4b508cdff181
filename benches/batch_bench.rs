use batch_squeeze::batch::{BatchScheduler, CompressTransform};
use batch_squeeze::export::{build_rename_archive, ZipArchiver};
use batch_squeeze::processing::{resize_to_fit, Codec, CompressionSettings, ImageCodec};
use batch_squeeze::rules::{derive_name, NameDeriver, RenameRule};
use batch_squeeze::store::ItemStore;
use batch_squeeze::{SourceFile, WorkItem};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn encoded_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("IMG_{:05} holiday photo.JPG", i)).collect()
}

fn bench_rule_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_evaluation");
    let names = names(1000);

    let rules = [
        ("sequence", RenameRule::default()),
        (
            "literal_replace",
            RenameRule::FindReplace {
                find: "IMG".to_string(),
                replacement: "photo".to_string(),
                use_regex: false,
            },
        ),
        (
            "regex_replace",
            RenameRule::FindReplace {
                find: r"\d+".to_string(),
                replacement: "N".to_string(),
                use_regex: true,
            },
        ),
    ];

    for (label, rule) in rules.iter() {
        group.bench_with_input(BenchmarkId::new("prepared", label), rule, |b, rule| {
            b.iter(|| {
                let deriver = NameDeriver::new(rule);
                names
                    .iter()
                    .enumerate()
                    .map(|(index, name)| deriver.derive(black_box(name), index))
                    .count()
            })
        });
    }

    group.bench_function("single_derive", |b| {
        let rule = RenameRule::default();
        b.iter(|| derive_name(black_box("IMG_0001.jpg"), black_box(42), &rule))
    });

    group.finish();
}

fn bench_image_resizing(c: &mut Criterion) {
    let mut group = c.benchmark_group("image_resizing");

    for (width, height) in [(800, 600), (1920, 1080)] {
        let img = gradient(width, height);
        group.bench_with_input(
            BenchmarkId::new("resize_to_fit", format!("{}x{}", width, height)),
            &img,
            |b, img| {
                b.iter(|| {
                    let mut img = img.clone();
                    resize_to_fit(black_box(&mut img), black_box(width / 2));
                })
            },
        );
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let input = encoded_jpeg(800, 600);
    let settings = CompressionSettings::new(Some(0.7), Some(400), None).unwrap();

    c.bench_function("codec_jpeg_800x600", |b| {
        b.iter(|| ImageCodec.compress(black_box(&input), black_box(&settings)))
    });
}

fn bench_batch_pass(c: &mut Criterion) {
    let input = encoded_jpeg(320, 240);
    let transform = CompressTransform::new(ImageCodec, CompressionSettings::default());

    c.bench_function("batch_pass_12_items", |b| {
        b.iter(|| {
            let store = ItemStore::in_memory();
            let items = (0..12)
                .map(|i| WorkItem::new(SourceFile::new(format!("{}.jpg", i), "image/jpeg", input.clone())))
                .collect();
            let ids = store.add(items);
            BatchScheduler::new(3).unwrap().run(&store, &ids, &transform).unwrap()
        })
    });
}

fn bench_rename_archive(c: &mut Criterion) {
    let store = ItemStore::in_memory();
    store.add(
        names(200)
            .into_iter()
            .map(|name| WorkItem::new(SourceFile::new(name, "image/jpeg", vec![7u8; 4096])))
            .collect(),
    );
    store.recompute(&RenameRule::default());

    c.bench_function("rename_archive_200_items", |b| {
        b.iter(|| build_rename_archive(black_box(&store), &ZipArchiver).unwrap())
    });
}

criterion_group!(
    benches,
    bench_rule_evaluation,
    bench_image_resizing,
    bench_codec,
    bench_batch_pass,
    bench_rename_archive
);
criterion_main!(benches);
