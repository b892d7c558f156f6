use crate::core::frame_buffer::FrameBuffer;
use crate::core::rasterizer::DrawCommand;
use crate::core::tile_grid::TileGrid;
use crate::core::tile_worker::{Completion, GraphState, TileWorker};
use crate::materials::texture::Texture;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use log::{debug, error, warn};
use std::cell::Cell;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// 工作线程栈大小；每个分块一个线程，默认配置下有4096个
const WORKER_STACK_SIZE: usize = 256 * 1024;

/// 帧同步控制器：管理全部分块工作线程
///
/// 负责广播帧状态、把绘制命令投递到各分块的有界队列，
/// 并在呈现前收集每个分块恰好一次的完成信号。
///
/// 设置了帧超时时，广播 Running 的时刻确定本帧期限；之后的每次投递、
/// Done 广播和完成等待都受同一期限约束。任何一步失败后控制器进入失效状态，
/// 丢弃队列中剩余的命令，不再接受新帧。
pub struct GraphController {
    state_senders: Vec<Sender<GraphState>>,
    command_senders: Vec<Sender<Arc<DrawCommand>>>,
    /// 与工作线程共享的命令队列接收端，仅用于失效时清空队列
    command_drains: Vec<Receiver<Arc<DrawCommand>>>,
    completion: Receiver<Completion>,
    handles: Vec<JoinHandle<()>>,
    frame_timeout: Option<Duration>,
    deadline: Cell<Option<Instant>>,
    failed: Cell<bool>,
}

impl GraphController {
    /// 为每个分块创建一个长期运行的工作线程
    ///
    /// 状态通道为同步交接（容量0），命令通道容量为 `queue_capacity`，
    /// 队列满时投递会阻塞，从而对几何阶段形成背压。
    /// `frame_timeout` 为 None 时每帧无限等待。
    pub fn spawn(
        grid: &TileGrid,
        frame_buffer: &Arc<FrameBuffer>,
        texture: Arc<Texture>,
        queue_capacity: usize,
        frame_timeout: Option<Duration>,
    ) -> Result<Self, String> {
        if queue_capacity == 0 {
            return Err("错误: 绘制命令队列容量必须大于0".to_string());
        }

        let tiles = frame_buffer.split_into_tiles(grid)?;
        let tile_count = tiles.len();
        let (completion_tx, completion_rx) = bounded(tile_count);

        let mut controller = GraphController {
            state_senders: Vec::with_capacity(tile_count),
            command_senders: Vec::with_capacity(tile_count),
            command_drains: Vec::with_capacity(tile_count),
            completion: completion_rx,
            handles: Vec::with_capacity(tile_count),
            frame_timeout,
            deadline: Cell::new(None),
            failed: Cell::new(false),
        };

        for tile in tiles {
            let id = tile.id;
            let (state_tx, state_rx) = bounded(0);
            let (command_tx, command_rx) = bounded(queue_capacity);
            controller.command_drains.push(command_rx.clone());
            let worker = TileWorker::new(
                tile,
                Arc::clone(&texture),
                command_rx,
                state_rx,
                completion_tx.clone(),
            );

            let handle = std::thread::Builder::new()
                .name(format!("tile-{}", id))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || worker.run())
                .map_err(|e| format!("创建分块 {} 工作线程失败: {}", id, e))?;

            controller.state_senders.push(state_tx);
            controller.command_senders.push(command_tx);
            controller.handles.push(handle);
        }

        debug!("已启动 {} 个分块工作线程", tile_count);
        Ok(controller)
    }

    pub fn tile_count(&self) -> usize {
        self.handles.len()
    }

    /// 上一帧是否因超时或工作线程退出而失败
    pub fn is_failed(&self) -> bool {
        self.failed.get()
    }

    /// 依次向每个分块广播状态；发送给分块 i 完成后才发送给 i+1
    ///
    /// 广播 Running 时开始计算本帧期限。
    pub fn change_state(&self, state: GraphState) -> Result<(), String> {
        self.ensure_usable()?;
        if state == GraphState::Running {
            self.deadline.set(self.frame_timeout.map(|t| Instant::now() + t));
        }

        for (id, sender) in self.state_senders.iter().enumerate() {
            self.send_by_deadline(sender, state).map_err(|e| {
                self.abandon_frame(match e {
                    SendTimeoutError::Timeout(_) => {
                        format!("帧同步超时: 分块 {} 未在期限内接收状态 {:?}", id, state)
                    }
                    SendTimeoutError::Disconnected(_) => {
                        format!("分块 {} 工作线程已退出，无法广播状态 {:?}", id, state)
                    }
                })
            })?;
        }
        Ok(())
    }

    /// 向单个分块投递绘制命令，队列满时阻塞（不超过本帧期限）
    pub fn notify_tile(&self, id: usize, command: &Arc<DrawCommand>) -> Result<(), String> {
        self.ensure_usable()?;
        let sender = self.command_senders.get(id).ok_or_else(|| {
            self.abandon_frame(format!(
                "分块编号 {} 超出范围 (共 {} 个)",
                id,
                self.tile_count()
            ))
        })?;

        self.send_by_deadline(sender, Arc::clone(command))
            .map_err(|e| {
                self.abandon_frame(match e {
                    SendTimeoutError::Timeout(_) => {
                        format!("帧同步超时: 分块 {} 的命令队列在期限内未腾出空间", id)
                    }
                    SendTimeoutError::Disconnected(_) => {
                        format!("分块 {} 工作线程已退出，无法投递绘制命令", id)
                    }
                })
            })
    }

    /// 阻塞直到收齐所有分块的完成信号，或本帧期限到达
    pub fn wait_for_tiles(&self) -> Result<(), String> {
        self.ensure_usable()?;
        collect_completions(&self.completion, self.tile_count(), self.deadline.get())
            .map_err(|e| self.abandon_frame(e))
    }

    fn ensure_usable(&self) -> Result<(), String> {
        if self.failed.get() {
            return Err("帧同步控制器已失效: 之前的帧未能完成".to_string());
        }
        Ok(())
    }

    fn send_by_deadline<T>(&self, sender: &Sender<T>, msg: T) -> Result<(), SendTimeoutError<T>> {
        match self.deadline.get() {
            None => sender
                .send(msg)
                .map_err(|e| SendTimeoutError::Disconnected(e.into_inner())),
            Some(deadline) => {
                sender.send_timeout(msg, deadline.saturating_duration_since(Instant::now()))
            }
        }
    }

    /// 标记失效并清空所有命令队列，工作线程只需完成手头的命令
    fn abandon_frame(&self, reason: String) -> String {
        error!("{}", reason);
        self.failed.set(true);
        let dropped: usize = self
            .command_drains
            .iter()
            .map(|queue| queue.try_iter().count())
            .sum();
        if dropped > 0 {
            warn!("丢弃了 {} 条未处理的绘制命令", dropped);
        }
        reason
    }

    /// 断开所有通道并等待工作线程退出，可重复调用
    pub fn shutdown(&mut self) {
        self.state_senders.clear();
        self.command_senders.clear();
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("tile").to_string();
            if handle.join().is_err() {
                warn!("工作线程 {} 异常退出", name);
            }
        }
    }
}

impl Drop for GraphController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 从完成通道收集 `expected` 个信号
///
/// 给定期限时，期限到达后返回错误，说明已收到多少个信号。
pub fn collect_completions(
    completion: &Receiver<Completion>,
    expected: usize,
    deadline: Option<Instant>,
) -> Result<(), String> {
    let mut received = 0;

    while received < expected {
        let result = match deadline {
            None => completion.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                completion.recv_timeout(remaining)
            }
        };

        match result {
            Ok(_) => received += 1,
            Err(RecvTimeoutError::Timeout) => {
                return Err(format!(
                    "帧同步超时: 只收到 {}/{} 个分块完成信号",
                    received, expected
                ));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(format!(
                    "完成通道已断开: 只收到 {}/{} 个分块完成信号",
                    received, expected
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use nalgebra::{Point3, Vector2};

    fn controller(size: usize, tile: usize) -> (Arc<FrameBuffer>, GraphController) {
        let grid = TileGrid::new(size, size, tile).unwrap();
        let fb = Arc::new(FrameBuffer::new(size, size, 10.0));
        let texture = Arc::new(Texture::solid_color([1, 2, 3, 255]));
        let controller = GraphController::spawn(&grid, &fb, texture, 4, None).unwrap();
        (fb, controller)
    }

    #[test]
    fn empty_frame_collects_every_tile() {
        let (_fb, controller) = controller(32, 16);
        assert_eq!(controller.tile_count(), 4);

        for _ in 0..3 {
            controller.change_state(GraphState::Running).unwrap();
            controller.change_state(GraphState::Done).unwrap();
            controller.wait_for_tiles().unwrap();
        }
    }

    #[test]
    fn commands_reach_their_tile() {
        let (fb, controller) = controller(32, 16);
        let command = Arc::new(DrawCommand::new(
            [
                Point3::new(17.0, 17.0, 0.0),
                Point3::new(30.0, 17.0, 0.0),
                Point3::new(17.0, 30.0, 0.0),
            ],
            [Vector2::zeros(); 3],
        ));

        fb.clear();
        controller.change_state(GraphState::Running).unwrap();
        // 比队列容量多，验证背压下仍能全部送达
        for _ in 0..10 {
            controller.notify_tile(3, &command).unwrap();
        }
        controller.change_state(GraphState::Done).unwrap();
        controller.wait_for_tiles().unwrap();

        assert_eq!(fb.color_at(20, 20), [1, 2, 3, 255]);
        assert_eq!(fb.color_at(5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn out_of_range_tile_is_an_error() {
        let (_fb, controller) = controller(16, 16);
        let command = Arc::new(DrawCommand::new([Point3::origin(); 3], [Vector2::zeros(); 3]));
        assert!(controller.notify_tile(1, &command).is_err());
    }

    #[test]
    fn failed_frame_rejects_further_frames() {
        let (_fb, controller) = controller(32, 16);
        let command = Arc::new(DrawCommand::new([Point3::origin(); 3], [Vector2::zeros(); 3]));

        controller.change_state(GraphState::Running).unwrap();
        assert!(controller.notify_tile(99, &command).is_err());
        assert!(controller.is_failed());

        let err = controller.change_state(GraphState::Running).unwrap_err();
        assert!(err.contains("失效"), "{}", err);
        assert!(controller.wait_for_tiles().is_err());
    }

    #[test]
    fn watchdog_reports_missing_acknowledgements() {
        let (tx, rx) = unbounded();
        tx.send(0).unwrap();

        let deadline = Instant::now() + Duration::from_millis(20);
        let err = collect_completions(&rx, 2, Some(deadline)).unwrap_err();
        assert!(err.contains("1/2"), "{}", err);
    }

    #[test]
    fn disconnected_completion_channel_is_an_error() {
        let (tx, rx) = unbounded::<Completion>();
        drop(tx);
        assert!(collect_completions(&rx, 1, None).is_err());
        assert!(collect_completions(&rx, 0, None).is_ok());
    }

    #[test]
    fn shutdown_joins_workers() {
        let (_fb, mut controller) = controller(32, 16);
        controller.shutdown();
        assert_eq!(controller.tile_count(), 0);
        controller.shutdown();
    }
}
