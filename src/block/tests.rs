
use crate::block::{Block, BlockResult, StreamFunctionality};

struct MockDecimator {
	pub window: usize,
}

impl StreamFunctionality<usize, (), u32, u32> for MockDecimator {

	fn control(&mut self, control:&usize) -> Result<(), &'static str> {
		self.window = *control;
		Ok(())
	}

	fn forecast(&self) -> usize {
		self.window
	}

	fn work(&mut self, input:&[u32]) -> (usize, BlockResult<u32>) {
		let sum:u32 = input[..self.window].iter().sum();
		(self.window, BlockResult::Ready(sum))
	}

}

#[tokio::test(flavor = "multi_thread")]
async fn block_buffers_chunks_and_emits_per_window() {

	let mut blk = Block::from(MockDecimator{ window: 4 });

	// 0..12 split into ragged chunks; the block should regroup them into
	// three windows of four samples each
	blk.tx_input.send(vec![0, 1, 2]).await.unwrap();
	blk.tx_input.send(vec![3, 4]).await.unwrap();
	blk.tx_input.send(vec![5, 6, 7, 8, 9, 10]).await.unwrap();
	blk.tx_input.send(vec![11]).await.unwrap();

	let mut results:Vec<u32> = vec![];
	for _ in 0..3 {
		results.push(blk.rx_output.recv().await.unwrap());
	}

	assert_eq!(results, vec![0 + 1 + 2 + 3, 4 + 5 + 6 + 7, 8 + 9 + 10 + 11]);

	blk.shutdown().await.unwrap();

}
