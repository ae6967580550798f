// Copyright 2017 Steven Stewart-Gallus
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.  See the License for the specific language governing
// permissions and limitations under the License.
//
use std::cell::Cell;
use std::hint;
use std::thread;

use crate::exp;

const NUM_LOOPS: usize = 30;
const MAX_LOG_NUM_PAUSES: usize = 7;

#[inline(always)]
pub fn pause() {
    hint::spin_loop();
}

#[inline(always)]
pub fn pause_times(spins: usize) {
    for _ in 0..spins {
        pause();
    }
}

// Use MMIX RNG
thread_local! {
    static RNG: Cell<u64> = Cell::new(rand::random());
}

/// A thread random number in `0..=max`
#[inline]
pub fn thread_num(max: usize) -> usize {
    let old = RNG.with(|rng| {
        let old = rng.get();
        rng.set(old.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407));
        old
    });
    // The high bits of an LCG are the random ones
    return ((old >> 33) as usize) % max.wrapping_add(1);
}

/// One step of a randomized exponential backoff.
///
/// The first `NUM_LOOPS` calls pause for a growing, jittered number
/// of spins; after that every call yields the processor instead.
#[inline]
pub fn spin_wait(counter: &mut usize) {
    if *counter < NUM_LOOPS {
        pause_times(thread_num(exp::exp(*counter, NUM_LOOPS, MAX_LOG_NUM_PAUSES)));
        *counter += 1;
    } else {
        thread::yield_now();
    }
}
