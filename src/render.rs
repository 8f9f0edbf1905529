// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render scheduler.  Owns the canvas for the duration of a
//! render, carves it into columns, and feeds those columns to a fixed
//! pool of worker threads over a single rendezvous channel.  The
//! workers live inside a crossbeam scope, and the scope does not
//! return until every one of them has finished, so the canvas that
//! comes back to the caller is always complete.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crossbeam::channel;
use image::{ImageBuffer, Rgba, RgbaImage};

use crate::errors::RenderError;
use crate::escape::{colour, escape_time, intensity, max_iterations};
use crate::planes::{IntegralPlane, Pixel, PlaneMapper, View};

/// How the workers get their results into the shared canvas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WriteStrategy {
    /// Each work unit carries an exclusive borrow of its own column,
    /// so no two workers can ever reach the same pixel and no lock is
    /// needed.
    Partitioned,
    /// Every pixel write goes through a single mutex around the whole
    /// canvas.  Slower, and strictly unnecessary, but the columns are
    /// disjoint either way.
    Locked,
}

impl Default for WriteStrategy {
    fn default() -> Self {
        WriteStrategy::Partitioned
    }
}

/// Hands every unit from `units` to exactly one of `threads` workers
/// (at least one), each of which calls `work` on it.  The calling
/// thread feeds the queue; the queue has no buffer, so a unit only
/// leaves the feeder when a worker is ready for it.  Returns once the
/// queue is drained and every worker has exited.
pub fn distribute<U, I, F>(units: I, threads: usize, work: F) -> Result<(), RenderError>
where
    U: Send,
    I: IntoIterator<Item = U>,
    F: Fn(U) + Sync,
{
    let threads = threads.max(1);
    let (tx, rx) = channel::bounded::<U>(0);
    let work = &work;
    crossbeam::scope(|spawner| {
        for worker in 0..threads {
            let rx = rx.clone();
            spawner.spawn(move |_| {
                debug!("worker {} started", worker);
                let mut done = 0;
                for unit in rx.iter() {
                    work(unit);
                    done += 1;
                }
                debug!("worker {} finished after {} units", worker, done);
            });
        }
        drop(rx);

        for unit in units {
            // Only fails if every worker has gone, i.e. they all
            // panicked; the scope will report that below.
            if tx.send(unit).is_err() {
                break;
            }
        }
        drop(tx);
    })
    .map_err(|_| RenderError::WorkerPanicked)
}

/// Holds the parameters of a single render.  Once built it is not
/// mutated; a render borrows it immutably and hands back a fresh
/// canvas, so the same Renderer can be rendered any number of times.
#[derive(Debug, Clone)]
pub struct Renderer {
    plane: PlaneMapper,
    max_iter: usize,
    strategy: WriteStrategy,
}

impl Renderer {
    /// Requires the view, the width and height of the canvas, and the
    /// level of detail (the iteration ceiling is `255 * detail`).
    pub fn new(
        view: View,
        width: usize,
        height: usize,
        detail: usize,
    ) -> Result<Self, RenderError> {
        let view = View::new(view.x_offset, view.y_offset, view.zoom)?;
        let plane = IntegralPlane(width, height).validate()?;
        Ok(Renderer {
            plane: PlaneMapper::new(view, plane),
            max_iter: max_iterations(detail),
            strategy: WriteStrategy::default(),
        })
    }

    /// Chooses how workers write into the canvas.
    pub fn with_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The mapping from canvas to complex plane this renderer uses.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The iteration ceiling.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// The write strategy in effect.
    pub fn strategy(&self) -> WriteStrategy {
        self.strategy
    }

    fn escape_at(&self, x: usize, y: usize) -> usize {
        escape_time(self.plane.pixel_to_point(&Pixel(x, y)), self.max_iter)
    }

    /// Evaluates a single pixel without rendering anything else.
    pub fn pixel(&self, x: usize, y: usize) -> Rgba<u8> {
        colour(self.escape_at(x, y))
    }

    fn blank_canvas(&self) -> RgbaImage {
        RgbaImage::new(self.plane.width() as u32, self.plane.height() as u32)
    }

    /// The single-threaded render: a plain scan over every pixel.
    pub fn render_single(&self) -> RgbaImage {
        let mut canvas = self.blank_canvas();
        for (x, y) in iproduct!(0..self.plane.width(), 0..self.plane.height()) {
            canvas.put_pixel(x as u32, y as u32, self.pixel(x, y));
        }
        canvas
    }

    /// The multi-threaded render.  Blocks until the canvas is complete.
    pub fn render(&self, threads: usize) -> Result<RgbaImage, RenderError> {
        let threads = threads.max(1);
        info!(
            "rendering {}x{} at ({}, {}) zoom {} with {} threads, {:?} writes, {} max iterations",
            self.plane.width(),
            self.plane.height(),
            self.plane.view.x_offset,
            self.plane.view.y_offset,
            self.plane.view.zoom,
            threads,
            self.strategy,
            self.max_iter
        );
        let start = Instant::now();
        let canvas = match self.strategy {
            WriteStrategy::Partitioned => self.render_partitioned(threads)?,
            WriteStrategy::Locked => self.render_locked(threads)?,
        };
        info!("render complete in {:?}", start.elapsed());
        Ok(canvas)
    }

    // The scratch buffer is column-major, so each column is one
    // contiguous slice and chunks_mut hands out exclusive borrows.
    fn render_partitioned(&self, threads: usize) -> Result<RgbaImage, RenderError> {
        let height = self.plane.height();
        let mut columns = vec![0 as u8; self.plane.len()];
        distribute(
            columns.chunks_mut(height).enumerate(),
            threads,
            |(x, column): (usize, &mut [u8])| {
                for (y, cell) in column.iter_mut().enumerate() {
                    *cell = intensity(self.escape_at(x, y));
                }
                trace!("column {} done", x);
            },
        )?;

        Ok(ImageBuffer::from_fn(
            self.plane.width() as u32,
            height as u32,
            |x, y| {
                let v = columns[x as usize * height + y as usize];
                Rgba([v, v, v, 255])
            },
        ))
    }

    fn render_locked(&self, threads: usize) -> Result<RgbaImage, RenderError> {
        let canvas = Mutex::new(self.blank_canvas());
        distribute(0..self.plane.width(), threads, |x: usize| {
            for y in 0..self.plane.height() {
                let rgba = self.pixel(x, y);
                canvas
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .put_pixel(x as u32, y as u32, rgba);
            }
            trace!("column {} done", x);
        })?;
        Ok(canvas.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::DETAIL;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small(view: View) -> Renderer {
        Renderer::new(view, 96, 64, 2).unwrap()
    }

    fn wide_view() -> View {
        View::new(0.0, 0.0, 4.0 / 96.0).unwrap()
    }

    #[test]
    fn distribute_hands_out_each_unit_once() {
        for &(units, threads) in &[(0, 1), (1, 1), (10, 1), (100, 4), (7, 16), (1000, 8)] {
            let counts: Vec<AtomicUsize> = (0..units).map(|_| AtomicUsize::new(0)).collect();
            distribute(0..units, threads, |u| {
                counts[u].fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            assert!(
                counts.iter().all(|c| c.load(Ordering::SeqCst) == 1),
                "{} units over {} threads",
                units,
                threads
            );
        }
    }

    #[test]
    fn distribute_treats_zero_threads_as_one() {
        let total = AtomicUsize::new(0);
        distribute(0..50, 0, |u| {
            total.fetch_add(u, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(total.load(Ordering::SeqCst), (0..50).sum::<usize>());
    }

    #[test]
    fn distribute_reports_a_panicking_worker() {
        let result = distribute(0..20, 4, |u| {
            if u == 13 {
                panic!("unlucky");
            }
        });
        match result {
            Err(RenderError::WorkerPanicked) => (),
            other => panic!("expected WorkerPanicked, got {:?}", other),
        }
    }

    #[test]
    fn every_pixel_is_written() {
        let r = small(wide_view());
        for strategy in &[WriteStrategy::Partitioned, WriteStrategy::Locked] {
            let canvas = r.clone().with_strategy(*strategy).render(4).unwrap();
            assert_eq!(canvas.dimensions(), (96, 64));
            assert!(canvas.pixels().all(|p| p[3] == 255), "{:?}", strategy);
        }
    }

    #[test]
    fn threaded_matches_sequential() {
        let r = small(View::new(-0.2, 0.1, 3.0 / 96.0).unwrap());
        let reference = r.render_single();
        for strategy in &[WriteStrategy::Partitioned, WriteStrategy::Locked] {
            let r = r.clone().with_strategy(*strategy);
            for threads in &[1, 2, 3, 8, 200] {
                let canvas = r.render(*threads).unwrap();
                assert!(
                    canvas.as_raw() == reference.as_raw(),
                    "{:?} with {} threads",
                    strategy,
                    threads
                );
            }
        }
    }

    #[test]
    fn repeated_concurrent_renders_agree() {
        let r = small(wide_view());
        let reference = r.render(1).unwrap();
        for _ in 0..10 {
            assert!(r.render(8).unwrap().as_raw() == reference.as_raw());
        }
    }

    #[test]
    fn render_matches_per_pixel_evaluation() {
        let r = small(wide_view());
        let canvas = r.render(3).unwrap();
        for (x, y) in iproduct!(0..96, 0..64) {
            assert_eq!(*canvas.get_pixel(x, y), r.pixel(x as usize, y as usize));
        }
    }

    #[test]
    fn reference_center_pixel() {
        let r = Renderer::new(View::default(), 2560, 1440, DETAIL).unwrap();
        assert_eq!(r.max_iter(), 7650);
        assert_eq!(r.pixel(1280, 720), Rgba([1, 1, 1, 255]));
    }

    #[test]
    fn doubling_zoom_halves_the_picture() {
        let (w, h) = (64, 48);
        let near = Renderer::new(View::new(0.1, -0.05, 0.05).unwrap(), w, h, 2).unwrap();
        let far = Renderer::new(View::new(0.1, -0.05, 0.1).unwrap(), w, h, 2).unwrap();
        let near = near.render(4).unwrap();
        let far = far.render(4).unwrap();
        let (cx, cy) = (w / 2, h / 2);
        let mut compared = 0;
        for (x, y) in iproduct!(cx / 2..(w + cx) / 2, cy / 2..(h + cy) / 2) {
            let (nx, ny) = (2 * x - cx, 2 * y - cy);
            assert_eq!(
                far.get_pixel(x as u32, y as u32),
                near.get_pixel(nx as u32, ny as u32),
                "far ({}, {}) vs near ({}, {})",
                x,
                y,
                nx,
                ny
            );
            compared += 1;
        }
        assert_eq!(compared, (w / 2) * (h / 2));
    }

    #[test]
    fn one_pixel_canvas() {
        let r = Renderer::new(View::default(), 1, 1, 1).unwrap();
        let canvas = r.render(4).unwrap();
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([1, 1, 1, 255]));
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(Renderer::new(View::default(), 0, 10, DETAIL).is_err());
        let nan = View {
            zoom: f64::NAN,
            ..View::default()
        };
        assert!(Renderer::new(nan, 10, 10, DETAIL).is_err());
    }

    #[test]
    #[ignore]
    fn reference_render() {
        let r = Renderer::new(View::default(), 2560, 1440, DETAIL).unwrap();
        let canvas = r.render(num_cpus::get()).unwrap();
        assert_eq!(*canvas.get_pixel(1280, 720), Rgba([1, 1, 1, 255]));
        assert!(canvas.pixels().all(|p| p[3] == 255));
    }
}
