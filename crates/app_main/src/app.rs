//! Application main loop

use crate::player::SystemPlayer;
use anyhow::Result;
use app_core::{
    AppConfig, AppError, BrowserWindow, Command, CommandId, CommandScope, Filter, GridMove,
    StartupAction, StartupGate, ThumbnailService, ViewerSession, WindowMode,
};
use app_ui::{
    components::{
        AdjustDialog, Dialog, DialogResult, GridAction, InfoDialog, MenuBar, MenuState, StatusInfo,
        ThumbnailGrid, ViewerCanvas,
    },
    InputHandler, Renderer, Theme,
};
use egui_wgpu::ScreenDescriptor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

/// Main application state for the event loop
struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,

    // UI Components
    grid: ThumbnailGrid,
    canvas: ViewerCanvas,
    input: InputHandler,
    theme: Theme,
    adjust: Option<AdjustDialog>,
    info: Option<InfoDialog>,

    // State
    browser: BrowserWindow,
    startup: StartupGate,
    message: String,
    title: String,
    last_tick: Instant,
}

impl App {
    fn new(config: AppConfig, thumbnails: ThumbnailService, open_path: Option<PathBuf>) -> Self {
        let startup = StartupGate::new(Duration::from_millis(config.startup.open_grace_ms));
        let input = InputHandler::new(&config.keybindings);
        let theme = Theme::from_config(&config);

        let mut app = Self {
            window: None,
            renderer: None,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            egui_renderer: None,

            grid: ThumbnailGrid::new(),
            canvas: ViewerCanvas::new(),
            input,
            theme,
            adjust: None,
            info: None,

            browser: BrowserWindow::new(config, thumbnails, Box::new(SystemPlayer)),
            startup,
            message: String::new(),
            title: String::new(),
            last_tick: Instant::now(),
        };

        if let Some(path) = open_path {
            app.offer_path(path);
        }
        app
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let general = &self.browser.config().general;
        let window_attrs = Window::default_attributes()
            .with_title("Glimpse")
            .with_inner_size(winit::dpi::LogicalSize::new(general.window_width, general.window_height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let renderer = pollster::block_on(Renderer::new(window.clone()))?;
        let max_texture_side = renderer.device.limits().max_texture_dimension_2d as usize;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            Some(max_texture_side),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &renderer.device,
            renderer.config.format,
            None,
            1,
            false,
        );

        self.theme.apply(&self.egui_ctx);

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);

        Ok(())
    }

    /// Feed a requested path to the startup gate
    fn offer_path(&mut self, path: PathBuf) {
        match self.startup.offer(path, Instant::now()) {
            Some(action) => self.apply_startup(action),
            None => tracing::info!("Ignoring open request outside the startup window"),
        }
    }

    fn apply_startup(&mut self, action: StartupAction) {
        if let Err(e) = self.browser.apply_startup(action) {
            self.report(&e);
        }
        if self.browser.current_dir().is_none() {
            // Fall back so the window is never empty
            if let Err(e) = self.browser.apply_startup(StartupAction::DefaultFolder) {
                self.report(&e);
            }
        }
    }

    fn report(&mut self, error: &AppError) {
        if error.is_fatal() {
            tracing::error!("{}", error);
        } else {
            tracing::warn!("{}", error);
        }
        self.message = error.user_message();
    }

    fn scope(&self) -> CommandScope {
        match self.browser.mode() {
            WindowMode::Browser => CommandScope::Browser,
            WindowMode::Viewer => CommandScope::Viewer,
        }
    }

    /// Close dialogs tied to the current viewer session
    fn close_dialogs(&mut self) {
        if self.adjust.take().is_some() {
            if let Some(viewer) = self.browser.viewer_mut() {
                viewer.cancel_adjust();
            }
        }
        self.info = None;
    }

    /// Execute a command. Returns whether it did anything.
    fn execute_command(&mut self, cmd: &Command) -> bool {
        let id = cmd.id.as_str();
        tracing::debug!("Executing command: {}", id);

        if !cmd.id.scope().applies_to(self.scope()) {
            tracing::debug!("Command {} not available in {:?} mode", id, self.browser.mode());
            return false;
        }

        let result: app_core::Result<bool> = match id {
            // === Navigation ===
            CommandId::NAV_MOVE_UP => Ok(self.browser.move_highlight(GridMove::Up)),
            CommandId::NAV_MOVE_DOWN => Ok(self.browser.move_highlight(GridMove::Down)),
            CommandId::NAV_MOVE_LEFT => Ok(self.browser.move_highlight(GridMove::Left)),
            CommandId::NAV_MOVE_RIGHT => Ok(self.browser.move_highlight(GridMove::Right)),
            CommandId::NAV_ENTER => self.browser.activate_highlighted().map(|_| true),
            CommandId::NAV_PARENT => self.browser.go_parent(),
            CommandId::NAV_NEXT_ITEM => {
                self.close_dialogs();
                self.browser.next_media()
            }
            CommandId::NAV_PREV_ITEM => {
                self.close_dialogs();
                self.browser.prev_media()
            }
            CommandId::NAV_BACK => {
                if self.adjust.is_some() || self.info.is_some() {
                    self.close_dialogs();
                } else {
                    self.browser.back();
                }
                Ok(true)
            }

            // === View ===
            CommandId::VIEW_TOGGLE_FULLSCREEN => Ok(self.toggle_fullscreen()),
            CommandId::VIEW_IMAGE_INFO => Ok(self.open_info()),
            CommandId::VIEW_ADJUST => {
                let started = self.browser.viewer_mut().is_some_and(|v| v.begin_adjust());
                if started {
                    self.adjust = Some(AdjustDialog::new());
                }
                Ok(started)
            }

            // === File ===
            CommandId::FILE_SAVE => match self.browser.viewer().map(|v| v.save()) {
                Some(Ok(Some(path))) => {
                    self.message = format!("Saved {}", path.display());
                    Ok(true)
                }
                Some(Ok(None)) | None => Ok(false),
                Some(Err(e)) => Err(e),
            },

            // === App ===
            CommandId::APP_EXIT => {
                self.browser.request_exit();
                Ok(true)
            }

            _ => match self.browser.viewer_mut() {
                Some(viewer) if viewer.is_adjusting() && is_edit(id) => {
                    self.message = "Finish the Adjust dialog first".to_string();
                    Ok(false)
                }
                Some(viewer) => viewer_command(viewer, cmd),
                None => {
                    tracing::debug!("Command {} ignored: nothing open", id);
                    Ok(false)
                }
            },
        };

        match result {
            Ok(done) => done,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    fn open_info(&mut self) -> bool {
        let Some(viewer) = self.browser.viewer() else {
            return false;
        };
        let Some(rows) = viewer.image_info() else {
            tracing::debug!("Image info ignored: not an image");
            return false;
        };
        let name = viewer
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.info = Some(InfoDialog::new(&name, rows));
        true
    }

    fn toggle_fullscreen(&mut self) -> bool {
        let Some(window) = &self.window else {
            return false;
        };
        let fullscreen = match window.fullscreen() {
            Some(_) => None,
            None => Some(Fullscreen::Borderless(None)),
        };
        window.set_fullscreen(fullscreen);
        true
    }

    fn render(&mut self) {
        let window = match &self.window {
            Some(w) => w.clone(),
            None => return,
        };

        let output = match self.renderer.as_ref().map(|r| r.acquire_frame()) {
            Some(Ok(Some(output))) => output,
            Some(Ok(None)) | None => return,
            Some(Err(e)) => {
                self.report(&e);
                self.recover_gpu(&window);
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = match &mut self.egui_state {
            Some(s) => s.take_egui_input(&window),
            None => return,
        };

        let ctx = self.egui_ctx.clone();
        let mut commands = Vec::new();
        let full_output = ctx.run(raw_input, |ctx| {
            commands = self.ui(ctx);
        });

        if let Some(egui_state) = &mut self.egui_state {
            egui_state.handle_platform_output(&window, full_output.platform_output);
        }

        let (Some(renderer), Some(egui_renderer)) = (&self.renderer, &mut self.egui_renderer) else {
            return;
        };

        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [renderer.size.0, renderer.size.1],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = renderer
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("egui encoder") });

        for (id, delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&renderer.device, &renderer.queue, *id, delta);
        }

        egui_renderer.update_buffers(
            &renderer.device,
            &renderer.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui render pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            egui_renderer.render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        renderer.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for cmd in commands {
            self.execute_command(&cmd);
        }
    }

    /// Recreate GPU resources after the device went away
    fn recover_gpu(&mut self, window: &Arc<Window>) {
        self.renderer = None;
        self.egui_renderer = None;
        match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => {
                self.egui_renderer = Some(egui_wgpu::Renderer::new(
                    &renderer.device,
                    renderer.config.format,
                    None,
                    1,
                    false,
                ));
                self.renderer = Some(renderer);
                // Textures lived on the old device
                self.grid = ThumbnailGrid::new();
                self.canvas.clear();
                tracing::info!("GPU resources recreated");
            }
            Err(e) => tracing::error!("Failed to recreate GPU resources: {}", e),
        }
    }

    /// Build the frame's widgets; returns commands raised by them
    fn ui(&mut self, ctx: &egui::Context) -> Vec<Command> {
        let mut commands = Vec::new();
        self.grid.sync_textures(ctx, self.browser.cells());

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            commands.extend(MenuBar::ui(ui, MenuState::from_window(&self.browser)));
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            StatusInfo::from_window(&self.browser, &self.message).ui(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| match self.browser.mode() {
                WindowMode::Browser => {
                    self.canvas.clear();
                    match self.grid.ui(ui, &mut self.browser, &self.theme) {
                        Some(GridAction::Highlight(index)) => {
                            self.browser.set_highlight(index);
                        }
                        Some(GridAction::Activate(index)) => {
                            self.browser.set_highlight(index);
                            commands.push(Command::new(CommandId::NAV_ENTER));
                        }
                        None => {}
                    }
                }
                WindowMode::Viewer => {
                    let modifier = self.input.selection_modifier();
                    let mut resized = None;
                    if let Some(viewer) = self.browser.viewer_mut() {
                        let response = self.canvas.ui(ui, viewer, modifier, self.theme.canvas);
                        resized = response.resized;
                        commands.extend(response.command);
                    }
                    if let Some(size) = resized {
                        self.browser.set_view_size(size);
                    }
                }
            });

        if let Some(dialog) = &mut self.info {
            if !matches!(dialog.ui(ctx), DialogResult::None) || !dialog.is_open() {
                self.info = None;
            }
        }

        let mut adjust_done = false;
        if let Some(dialog) = &mut self.adjust {
            let result = dialog.ui(ctx);
            let changed = dialog.take_changed();
            if let Some(viewer) = self.browser.viewer_mut() {
                if let Some(settings) = changed {
                    viewer.preview_adjust(settings);
                }
                match result {
                    DialogResult::Ok(_) => {
                        viewer.accept_adjust();
                    }
                    DialogResult::Cancel => {
                        viewer.cancel_adjust();
                    }
                    DialogResult::None => {}
                }
            }
            adjust_done = !dialog.is_open();
        }
        if adjust_done {
            self.adjust = None;
        }

        commands
    }

    /// Per-frame housekeeping outside of egui
    fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).as_millis() as u64;
        self.last_tick = now;

        if let Some(action) = self.startup.poll(now) {
            self.apply_startup(action);
        }

        self.browser.tick(elapsed);
        self.browser.poll_thumbnails();

        if self.browser.mode() == WindowMode::Browser && (self.adjust.is_some() || self.info.is_some()) {
            self.close_dialogs();
        }

        let title = match (self.browser.mode(), self.browser.viewer()) {
            (WindowMode::Viewer, Some(v)) => format!("Glimpse - {}", v.path().display()),
            _ => match self.browser.current_dir() {
                Some(dir) => format!("Glimpse - {}", dir.display()),
                None => "Glimpse".to_string(),
            },
        };
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }
}

/// Commands that act on the open viewer session
/// Commands that change the committed image or its history
fn is_edit(id: &str) -> bool {
    id.starts_with("filter.") || id == CommandId::EDIT_UNDO || id == CommandId::EDIT_CROP
}

fn viewer_command(viewer: &mut ViewerSession, cmd: &Command) -> app_core::Result<bool> {
    let id = cmd.id.as_str();

    if let Some(filter) = filter_for(id, viewer) {
        return Ok(viewer.apply_filter(filter));
    }

    let done = match id {
        CommandId::VIEW_ZOOM_TO_RECT => viewer.zoom_to_rect(),
        CommandId::VIEW_RESET_ZOOM => viewer.reset_zoom(),
        CommandId::EDIT_UNDO => viewer.undo(),
        CommandId::EDIT_CROP => viewer.crop(),
        _ => {
            let Some(video) = viewer.video_mut() else {
                tracing::debug!("Command {} ignored: no video", id);
                return Ok(false);
            };
            match id {
                CommandId::VIDEO_PLAY_PAUSE => {
                    video.play_pause()?;
                    true
                }
                CommandId::VIDEO_SKIP_FORWARD => {
                    video.skip_forwards();
                    true
                }
                CommandId::VIDEO_SKIP_BACKWARD => {
                    video.skip_backwards();
                    true
                }
                CommandId::VIDEO_VOLUME_UP => {
                    video.increase_volume();
                    true
                }
                CommandId::VIDEO_VOLUME_DOWN => {
                    video.decrease_volume();
                    true
                }
                CommandId::VIDEO_TOGGLE_MUTE => {
                    video.toggle_mute();
                    true
                }
                CommandId::VIDEO_JUMP => match cmd.params.int_value {
                    Some(permille) => video.jump_to(permille as f32 / 1000.0),
                    None => false,
                },
                _ => {
                    tracing::warn!("Unknown command: {}", id);
                    false
                }
            }
        }
    };
    Ok(done)
}

/// Filter a `filter.*` command applies to the viewer's image
fn filter_for(id: &str, viewer: &ViewerSession) -> Option<Filter> {
    let filter = match id {
        CommandId::FILTER_SHARPEN => Filter::Sharpen,
        CommandId::FILTER_BLUR => Filter::Blur,
        CommandId::FILTER_CONTOUR => Filter::Contour,
        CommandId::FILTER_DETAIL => Filter::Detail,
        CommandId::FILTER_EDGE_ENHANCE => Filter::EdgeEnhance,
        CommandId::FILTER_EMBOSS => Filter::Emboss,
        CommandId::FILTER_FIND_EDGES => Filter::FindEdges,
        CommandId::FILTER_SMOOTH => Filter::Smooth,
        CommandId::FILTER_UNSHARP_MASK => Filter::UnsharpMask,
        CommandId::FILTER_AUTO_CONTRAST => Filter::AutoContrast,
        CommandId::FILTER_COLOUR_UP => Filter::Colour(viewer.step_factor(true)),
        CommandId::FILTER_COLOUR_DOWN => Filter::Colour(viewer.step_factor(false)),
        CommandId::FILTER_CONTRAST_UP => Filter::Contrast(viewer.step_factor(true)),
        CommandId::FILTER_CONTRAST_DOWN => Filter::Contrast(viewer.step_factor(false)),
        CommandId::FILTER_BRIGHTNESS_UP => Filter::Brightness(viewer.step_factor(true)),
        CommandId::FILTER_BRIGHTNESS_DOWN => Filter::Brightness(viewer.step_factor(false)),
        CommandId::FILTER_BLACK_AND_WHITE => Filter::BlackAndWhite,
        CommandId::FILTER_DENOISE => Filter::Denoise,
        CommandId::FILTER_SUPER_RESOLUTION => Filter::SuperResolution(viewer.super_resolution_factor()),
        _ => return None,
    };
    Some(filter)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                tracing::error!("Failed to initialize window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first
        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.consumed {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((size.width, size.height));
                }
            }

            WindowEvent::DroppedFile(path) => {
                self.offer_path(path);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(cmd) = self.input.handle_key(&event, self.scope()) {
                    self.execute_command(&cmd);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(cmd) = self.input.handle_mouse_button(button, state) {
                    self.execute_command(&cmd);
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.input.update_modifiers(modifiers.state());
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }

        if self.browser.exit_requested() {
            tracing::info!("Exiting");
            event_loop.exit();
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.tick();

        if self.browser.exit_requested() {
            event_loop.exit();
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Run the application
pub fn run(config: AppConfig, thumbnails: ThumbnailService, open_path: Option<PathBuf>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, thumbnails, open_path);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn session() -> ViewerSession {
        let image = image::DynamicImage::new_rgb8(4, 4);
        ViewerSession::from_image(
            Path::new("a.png"),
            image,
            None,
            &AppConfig::default(),
            app_core::Size::new(100.0, 100.0),
        )
    }

    #[test]
    fn test_every_filter_command_maps() {
        let viewer = session();
        for id in [
            CommandId::FILTER_SHARPEN,
            CommandId::FILTER_COLOUR_DOWN,
            CommandId::FILTER_BRIGHTNESS_UP,
            CommandId::FILTER_SUPER_RESOLUTION,
        ] {
            assert!(filter_for(id, &viewer).is_some(), "{}", id);
        }
        assert!(filter_for(CommandId::EDIT_UNDO, &viewer).is_none());
    }

    #[test]
    fn test_viewer_commands() {
        let mut viewer = session();
        assert!(viewer_command(&mut viewer, &Command::new(CommandId::FILTER_BLUR)).unwrap());
        assert!(viewer.is_modified());
        assert!(viewer_command(&mut viewer, &Command::new(CommandId::EDIT_UNDO)).unwrap());
        assert!(!viewer.is_modified());
        // No selection, no video
        assert!(!viewer_command(&mut viewer, &Command::new(CommandId::EDIT_CROP)).unwrap());
        assert!(!viewer_command(&mut viewer, &Command::new(CommandId::VIDEO_PLAY_PAUSE)).unwrap());
    }

    #[test]
    fn test_edit_commands_are_recognised() {
        assert!(is_edit(CommandId::FILTER_SHARPEN));
        assert!(is_edit(CommandId::EDIT_UNDO));
        assert!(is_edit(CommandId::EDIT_CROP));
        assert!(!is_edit(CommandId::VIEW_RESET_ZOOM));
        assert!(!is_edit(CommandId::VIDEO_PLAY_PAUSE));
    }
}
