mod common;

use common::{size_at, spawner, ScriptedRasterizer, ScriptedSource};
use futures::executor::LocalPool;
use pageview_scheduler::{AsyncResult, Failure};
use pdf_engine::{build_blank_pdf, default_engine, LopdfEngine, PageSize};
use viewer_core::{
    fetch_file, open_view, EngineRasterizer, EngineSource, MemorySurface, RenderOutcome,
    SlotState, ViewConfig, ZoomChange,
};

#[test]
fn opens_every_page_and_renders_at_initial_zoom() {
    let mut pool = LocalPool::new();
    let rasterizer = ScriptedRasterizer::new();
    let config = ViewConfig::new().with_initial_zoom(1.5);

    let opening = open_view(
        ScriptedSource { page_count: 3, failing_page: None },
        rasterizer.clone(),
        AsyncResult::ok(b"%PDF".to_vec()),
        |_| MemorySurface::new(),
        spawner(&pool),
        config,
    );
    let opened = pool.run_until(opening).unwrap();

    assert_eq!(opened.controller.page_count(), 3);
    assert_eq!(opened.controller.state().zoom, 1.5);
    assert_eq!(rasterizer.calls(), 3);

    pool.run_until_stalled();
    rasterizer.release(1.5);
    let outcomes = pool.run_until(opened.initial_render).unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|outcome| matches!(outcome, RenderOutcome::Committed { .. })));
    for slot in opened.controller.slots() {
        assert_eq!(
            slot.with_surface(|surface| surface.visible().map(|bitmap| bitmap.dimensions())),
            Some(size_at(1.5))
        );
    }
}

#[test]
fn page_load_failure_aborts_setup() {
    let mut pool = LocalPool::new();
    let rasterizer = ScriptedRasterizer::new();

    let opening = open_view(
        ScriptedSource { page_count: 4, failing_page: Some(3) },
        rasterizer.clone(),
        AsyncResult::ok(b"%PDF".to_vec()),
        |_| MemorySurface::new(),
        spawner(&pool),
        ViewConfig::default(),
    );

    let err = pool.run_until(opening).err().unwrap();
    assert!(matches!(err, Failure::PageLoad { page: 3, .. }));
    assert_eq!(rasterizer.calls(), 0);
}

#[test]
fn document_load_failure_aborts_setup() {
    let mut pool = LocalPool::new();

    let opening = open_view(
        ScriptedSource { page_count: 2, failing_page: None },
        ScriptedRasterizer::new(),
        AsyncResult::ok(Vec::new()),
        |_| MemorySurface::new(),
        spawner(&pool),
        ViewConfig::default(),
    );

    let err = pool.run_until(opening).err().unwrap();
    assert!(matches!(err, Failure::DocumentLoad { .. }));
}

#[test]
fn missing_file_is_a_fetch_failure() {
    let mut pool = LocalPool::new();
    let dir = tempfile::tempdir().unwrap();

    let err = pool.run_until(fetch_file(dir.path().join("absent.pdf"))).unwrap_err();

    assert!(matches!(err, Failure::Fetch { .. }));
    assert!(err.message().contains("absent.pdf"));
    assert!(err.cause().is_some());
}

#[test]
fn renders_a_pdf_file_end_to_end() {
    let mut pool = LocalPool::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two-pages.pdf");
    let bytes =
        build_blank_pdf(&[PageSize::LETTER, PageSize { width_pt: 300.0, height_pt: 200.0 }])
            .unwrap();
    std::fs::write(&path, bytes).unwrap();

    let opening = open_view(
        EngineSource::new(default_engine()),
        EngineRasterizer::<LopdfEngine>::new(),
        fetch_file(&path),
        |_| MemorySurface::new(),
        spawner(&pool),
        ViewConfig::new().with_initial_zoom(0.5),
    );
    let opened = pool.run_until(opening).unwrap();
    let outcomes = pool.run_until(opened.initial_render).unwrap();

    assert_eq!(
        outcomes,
        vec![
            RenderOutcome::Committed { page: 1, scale: 0.5 },
            RenderOutcome::Committed { page: 2, scale: 0.5 },
        ]
    );

    let sizes: Vec<_> = opened
        .controller
        .slots()
        .iter()
        .map(|slot| slot.with_surface(|surface| surface.visible().map(|bitmap| bitmap.dimensions())))
        .collect();
    assert_eq!(sizes, vec![Some((306, 396)), Some((150, 100))]);
}

#[test]
fn oversized_page_fails_to_render_instead_of_allocating() {
    let mut pool = LocalPool::new();
    let huge = PageSize { width_pt: 1e10, height_pt: 1e10 };
    let bytes = build_blank_pdf(&[PageSize::LETTER, huge]).unwrap();

    let opening = open_view(
        EngineSource::new(default_engine()),
        EngineRasterizer::<LopdfEngine>::new(),
        AsyncResult::ok(bytes),
        |_| MemorySurface::new(),
        spawner(&pool),
        ViewConfig::default(),
    );
    let opened = pool.run_until(opening).unwrap();

    let err = pool.run_until(opened.initial_render).unwrap_err();
    assert!(matches!(err, Failure::Render { page: 2, .. }));
    pool.run_until_stalled();

    let letter = opened.controller.slot(1).unwrap();
    assert_eq!(letter.committed_scale(), Some(1.0));

    let oversized = opened.controller.slot(2).unwrap();
    assert!(matches!(oversized.state(), SlotState::Failed { .. }));
    assert!(!oversized.with_surface(MemorySurface::is_loading));
    assert!(oversized.with_surface(|surface| surface.visible().is_none()));
    assert_eq!(oversized.with_surface(MemorySurface::size), (0, 0));
}

#[test]
fn pixel_budget_comes_from_config() {
    let mut pool = LocalPool::new();
    let bytes = build_blank_pdf(&[PageSize::LETTER]).unwrap();

    // 612x792 is just under half a million pixels
    let opening = open_view(
        EngineSource::new(default_engine()),
        EngineRasterizer::<LopdfEngine>::new(),
        AsyncResult::ok(bytes),
        |_| MemorySurface::new(),
        spawner(&pool),
        ViewConfig::new().with_max_bitmap_pixels(400_000),
    );
    let mut opened = pool.run_until(opening).unwrap();

    let err = pool.run_until(opened.initial_render).unwrap_err();
    assert!(matches!(err, Failure::Render { page: 1, .. }));

    let outcomes =
        pool.run_until(opened.controller.set_zoom(ZoomChange::To(0.5))).unwrap();
    assert_eq!(outcomes, vec![RenderOutcome::Committed { page: 1, scale: 0.5 }]);
}
