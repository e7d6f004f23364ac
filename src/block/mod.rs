
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ChannelErr;

#[cfg(test)]
mod tests;

pub enum BlockResult<U> {
	NotReady,
	Ready(U),
	Err(ChannelErr),
}

impl<U> BlockResult<U> {

	pub fn unwrap(self) -> U {
		match self {
			Self::Ready(u) => u,
			_ => panic!("Called unwrap on something other than BlockResult::Ready"),
		}
	}

}

// A type that implements StreamFunctionality consumes samples from the front
// of the window it is offered and produces at most one output per call.  The
// scheduler must offer at least forecast() samples per work call; how many
// were actually consumed comes back in the first tuple element.
pub trait StreamFunctionality<C: Clone, D, T: Clone, U> {

	fn control(&mut self, control:&C) -> Result<D, &'static str>;
	fn forecast(&self) -> usize;
	fn work(&mut self, input:&[T]) -> (usize, BlockResult<U>);

}

pub struct Block<C: 'static + Send, T: 'static + Send, U: 'static + Send> {
	pub tx_control: mpsc::Sender<C>,
	pub tx_input:   mpsc::Sender<Vec<T>>,
	pub rx_output:  mpsc::Receiver<U>,
	pub handles:    Vec<JoinHandle<Result<(), &'static str>>>,
}

impl<C: 'static + Send + Sync + Clone, T: 'static + Send + Sync + Clone, U: 'static + Send + Sync> Block<C, T, U> {

	pub fn from<B: 'static + StreamFunctionality<C, (), T, U> + Send + Sync>(b:B) -> Self {

		let (tx_control, mut rx_control) = mpsc::channel::<C>(10);
		let (tx_input,   mut rx_input)   = mpsc::channel::<Vec<T>>(10);
		let (tx_output,  rx_output)      = mpsc::channel::<U>(10);

		let handle:JoinHandle<Result<(), &'static str>> = tokio::spawn(async move {

			let mut owned_b = b;
			let mut buffer:Vec<T> = vec![];

			'rx: while let Some(chunk) = rx_input.recv().await {

				// Interleaving control handling with input handling prevents us from having to
				// use a mutex to protect the state
				if let Ok(c) = rx_control.try_recv() {
					owned_b.control(&c)?;
				}

				buffer.extend_from_slice(&chunk);

				while buffer.len() >= owned_b.forecast() {
					let (consumed, result) = owned_b.work(&buffer);
					buffer.drain(..consumed);

					match result {
						BlockResult::Ready(u) => tx_output.send(u).await.map_err(|_| "Unable to send output")?,
						BlockResult::NotReady => (),
						BlockResult::Err(e)   => {
							eprintln!("Error in block: {:?}", e);
							break 'rx;
						},
					}

					// A block that consumed nothing has no more progress to make this window
					if consumed == 0 { break; }
				}

			}

			Ok(())
		});

		let handles = vec![handle];

		Block{ tx_control, tx_input, rx_output, handles }
	}

	pub async fn shutdown(self) -> Result<(), &'static str> {

		let Block{ tx_control, tx_input, rx_output:_, handles } = self;

		drop(tx_control);
		drop(tx_input);

		for handle in handles {
			handle.await.unwrap()?;
		}

		Ok(())
	}

}
