use crate::app::SharedApp;
use crate::fetch;
use crate::render;
use sky_core::InstanceData;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub struct FrameContext<'a> {
    pub app: SharedApp,
    pub gpu: Option<render::GpuState<'a>>,
    pub instances: Vec<InstanceData>,
}

impl<'a> FrameContext<'a> {
    pub fn frame(&mut self) {
        let mut app = self.app.borrow_mut();
        let now = app.now_ms();
        for feed in app.engine.due_feeds(now) {
            let url = app.engine.feed_url(feed);
            let shared = self.app.clone();
            spawn_local(async move {
                let body = fetch::fetch_text(&url).await;
                let mut app = shared.borrow_mut();
                // errors are logged by the world updater
                _ = match &body {
                    Ok(text) => app.engine.ingest(feed, Ok(text.as_str())),
                    Err(e) => app.engine.ingest(feed, Err(&e.to_string())),
                };
            });
        }
        app.engine.frame(now, &mut self.instances);
        drop(app);

        if let Some(gpu) = self.gpu.as_mut() {
            gpu.render(&self.instances);
        }
    }
}

pub async fn init_gpu(canvas: &web::HtmlCanvasElement) -> Option<render::GpuState<'static>> {
    // leak a canvas clone to satisfy 'static lifetime for surface
    let leaked_canvas = Box::leak(Box::new(canvas.clone()));
    match render::GpuState::new(leaked_canvas).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("[gpu] WebGPU init error: {:?}", e);
            None
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext<'static>>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx_tick.borrow_mut().frame();
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
