//! Render graph benchmarks: compile cost for a typical frame graph, and
//! the serial vs. parallel draw-call sort across list sizes.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use glam::{Mat4, Vec4};

use kiln::{
    DepthAttachment, DrawList, GeometryId, LoadOp, PassKind, RenderGraph, ResourceUsage, StoreOp,
    TextureFormat, WorkerPool, encode_sort_key,
};

fn build_frame_graph() -> RenderGraph {
    let mut graph = RenderGraph::new();
    let shadow_map = graph.create_depth_buffer("shadow_map", 2048, 2048, TextureFormat::Depth32Float);
    let main_color = graph.create_texture_2d(
        "main_color",
        1920,
        1080,
        TextureFormat::Rgba16Float,
        ResourceUsage::RENDER_TARGET,
    );
    let main_depth = graph.create_depth_buffer("main_depth", 1920, 1080, TextureFormat::Depth32Float);
    let bloom = graph.create_texture_2d(
        "bloom",
        960,
        540,
        TextureFormat::Rgba16Float,
        ResourceUsage::RENDER_TARGET,
    );
    let backbuffer = graph.import_backbuffer(1920, 1080, TextureFormat::Bgra8Unorm);

    let shadow = graph.add_pass("shadow", PassKind::Graphics).unwrap();
    shadow.set_depth_attachment(DepthAttachment::clear(shadow_map, 1.0));

    let main = graph.add_pass("main", PassKind::Graphics).unwrap();
    main.add_color_attachment(main_color, LoadOp::Clear, StoreOp::Store, Vec4::ZERO);
    main.set_depth_attachment(DepthAttachment::clear(main_depth, 1.0));
    main.add_resource_read(shadow_map, 0, 1, kiln::ShaderStageFlags::FRAGMENT);

    let bloom_pass = graph.add_pass("bloom", PassKind::Graphics).unwrap();
    bloom_pass.add_color_attachment(bloom, LoadOp::Clear, StoreOp::Store, Vec4::ZERO);
    bloom_pass.add_resource_read(main_color, 0, 0, kiln::ShaderStageFlags::FRAGMENT);

    let post = graph.add_pass("post", PassKind::Graphics).unwrap();
    post.add_color_attachment(backbuffer, LoadOp::DontCare, StoreOp::Store, Vec4::ZERO);
    post.add_resource_read(main_color, 0, 0, kiln::ShaderStageFlags::FRAGMENT);
    post.add_resource_read(bloom, 0, 1, kiln::ShaderStageFlags::FRAGMENT);

    graph
}

fn fill_list(count: u64) -> DrawList {
    let mut list = DrawList::with_capacity(count as usize);
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for tag in 0..count {
        // xorshift keeps fills deterministic across runs.
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        list.push(kiln::DrawCall {
            geometry: GeometryId(tag as u32),
            material_id: (state >> 32) as u32 % 256,
            model_matrix: Mat4::IDENTITY,
            sort_key: encode_sort_key((state >> 32) as u32 % 256, (state as u32 % 10_000) as f32),
            user_data: tag,
        });
    }
    list
}

fn bench_compile(c: &mut Criterion) {
    let _ = env_logger::try_init();
    c.bench_function("compile_frame_graph", |b| {
        b.iter_batched(
            build_frame_graph,
            |mut graph| {
                graph.compile().unwrap();
                graph
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_sort(c: &mut Criterion) {
    let pool = WorkerPool::new(std::thread::available_parallelism().map_or(4, |n| n.get()));

    for count in [1_000u64, 8_192] {
        c.bench_function(&format!("sort_serial_{count}"), |b| {
            b.iter_batched(
                || fill_list(count),
                |mut list| {
                    list.sort_by_sort_key();
                    list
                },
                BatchSize::SmallInput,
            );
        });
        c.bench_function(&format!("sort_parallel_{count}"), |b| {
            b.iter_batched(
                || fill_list(count),
                |mut list| {
                    list.sort_by_sort_key_parallel(Some(&pool));
                    list
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, bench_compile, bench_sort);
criterion_main!(benches);
