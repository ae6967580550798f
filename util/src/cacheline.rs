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
use std::ops::{Deref, DerefMut};

/// Pads a value out to its own cache line so that neighbouring hot
/// atomics do not false share.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheLineAligned<T> {
    value: T,
}

impl<T> CacheLineAligned<T> {
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        CacheLineAligned { value: value }
    }
}

impl<T> Deref for CacheLineAligned<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CacheLineAligned<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::mem;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn padded_to_a_line() {
        assert_eq!(mem::align_of::<CacheLineAligned<AtomicBool>>(), 64);
        assert_eq!(mem::size_of::<CacheLineAligned<AtomicBool>>(), 64);
    }
}
