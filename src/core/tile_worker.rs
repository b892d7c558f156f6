use crate::core::frame_buffer::TileView;
use crate::core::rasterizer::{DrawCommand, rasterize_in_tile};
use crate::materials::texture::Texture;
use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, trace};
use std::sync::Arc;

/// 每帧广播给所有分块的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphState {
    #[default]
    Init,
    Running,
    Done,
}

/// 工作线程事件循环处理的两类事件
#[derive(Debug)]
pub enum WorkerEvent {
    StateChanged(GraphState),
    CommandReceived(Arc<DrawCommand>),
}

/// 分块完成信号，携带分块编号
pub type Completion = usize;

/// 分块工作线程：独占一个分块的像素范围
///
/// 状态机 {Init, Running, Done}。事件选取规则：绘制命令优先，
/// 命令队列为空时才阻塞等待两个通道中任意一个。
/// 完成判定在每个事件之后执行：状态为 Done 且命令队列为空时发出一次完成信号，
/// 每帧恰好一次（收到 Running 时复位）。
pub struct TileWorker {
    tile: TileView,
    texture: Arc<Texture>,
    commands: Receiver<Arc<DrawCommand>>,
    states: Receiver<GraphState>,
    completion: Sender<Completion>,
    state: GraphState,
    completed: bool,
    pixels_written: usize,
}

impl TileWorker {
    pub fn new(
        tile: TileView,
        texture: Arc<Texture>,
        commands: Receiver<Arc<DrawCommand>>,
        states: Receiver<GraphState>,
        completion: Sender<Completion>,
    ) -> Self {
        TileWorker {
            tile,
            texture,
            commands,
            states,
            completion,
            state: GraphState::Init,
            completed: false,
            pixels_written: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.tile.id
    }

    /// 事件循环；通道断开（线程池关闭）时返回
    pub fn run(mut self) {
        debug!("分块 {} 工作线程启动", self.id());
        while let Some(event) = self.next_event() {
            if !self.handle(event) {
                break;
            }
        }
        debug!("分块 {} 工作线程退出", self.id());
    }

    /// 取下一个事件：队列中已有命令时直接取命令，否则阻塞等待任一通道
    fn next_event(&self) -> Option<WorkerEvent> {
        if let Ok(command) = self.commands.try_recv() {
            return Some(WorkerEvent::CommandReceived(command));
        }
        select! {
            recv(self.commands) -> msg => msg.ok().map(WorkerEvent::CommandReceived),
            recv(self.states) -> msg => msg.ok().map(WorkerEvent::StateChanged),
        }
    }

    /// 处理单个事件并执行完成判定；返回 false 表示完成信号已无人接收
    pub fn handle(&mut self, event: WorkerEvent) -> bool {
        match event {
            WorkerEvent::StateChanged(state) => {
                trace!("分块 {} 状态 {:?} -> {:?}", self.id(), self.state, state);
                if state == GraphState::Running {
                    self.completed = false;
                    self.pixels_written = 0;
                }
                self.state = state;
            }
            WorkerEvent::CommandReceived(command) => {
                self.pixels_written += rasterize_in_tile(&command, &self.tile, &self.texture);
            }
        }
        self.check_completion()
    }

    fn check_completion(&mut self) -> bool {
        if self.state != GraphState::Done || self.completed || !self.commands.is_empty() {
            return true;
        }
        self.completed = true;
        trace!(
            "分块 {} 完成本帧，写入 {} 个像素",
            self.id(),
            self.pixels_written
        );
        self.completion.send(self.id()).is_ok()
    }
}
