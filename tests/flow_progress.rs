// Copyright (c) 2026 Concordat
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]

use concordat::core::flow::progress::{
    InitiatorStage, ProgressError, ProgressTracker, ResponderStage,
};

#[test]
fn advance_moves_strictly_forward_and_is_observable() {
    let tracker = ProgressTracker::new(InitiatorStage::Acquiring);
    let rx = tracker.subscribe();
    assert_eq!(tracker.current(), InitiatorStage::Acquiring);

    tracker.advance(InitiatorStage::Building).unwrap();
    // A single-party flow never collects; skipping stages is allowed.
    tracker.advance(InitiatorStage::Finalising).unwrap();
    assert_eq!(tracker.current(), InitiatorStage::Finalising);
    assert_eq!(*rx.borrow(), InitiatorStage::Finalising);

    tracker.advance(InitiatorStage::Done).unwrap();
    assert_eq!(*rx.borrow(), InitiatorStage::Done);
}

#[test]
fn advance_rejects_backwards_and_repeated_stages() {
    let tracker = ProgressTracker::new(InitiatorStage::Verifying);
    assert_eq!(
        tracker.advance(InitiatorStage::Verifying),
        Err(ProgressError::OutOfOrder)
    );
    assert_eq!(
        tracker.advance(InitiatorStage::Acquiring),
        Err(ProgressError::OutOfOrder)
    );
    // The failed transitions must not move the tracker.
    assert_eq!(tracker.current(), InitiatorStage::Verifying);

    tracker.advance(InitiatorStage::Done).unwrap();
    assert_eq!(
        tracker.advance(InitiatorStage::Collecting),
        Err(ProgressError::OutOfOrder)
    );
}

#[test]
fn responder_stages_follow_the_same_ordering() {
    let tracker = ProgressTracker::new(ResponderStage::Receiving);
    tracker.advance(ResponderStage::Checking).unwrap();
    tracker.advance(ResponderStage::Signing).unwrap();
    assert_eq!(
        tracker.advance(ResponderStage::Receiving),
        Err(ProgressError::OutOfOrder)
    );
    tracker.advance(ResponderStage::AwaitingFinality).unwrap();
    tracker.advance(ResponderStage::Done).unwrap();
    assert_eq!(tracker.current(), ResponderStage::Done);
}
