//! Motivational quotes shown on the warning interstitial.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub const PRODUCTIVITY_QUOTES: &[Quote] = &[
    Quote {
        text: "The key is not to prioritize what’s on your schedule, but to schedule your priorities.",
        author: "Stephen Covey",
    },
    Quote {
        text: "Do the hard jobs first. The easy jobs will take care of themselves.",
        author: "Dale Carnegie",
    },
    Quote {
        text: "You can do anything, but not everything.",
        author: "David Allen",
    },
    Quote {
        text: "Focus on being productive instead of busy.",
        author: "Tim Ferriss",
    },
    Quote {
        text: "What is important is seldom urgent, and what is urgent is seldom important.",
        author: "Dwight D. Eisenhower",
    },
    Quote {
        text: "The way to get started is to quit talking and begin doing.",
        author: "Walt Disney",
    },
    Quote {
        text: "Success is the sum of small efforts repeated day in and day out.",
        author: "Robert Collier",
    },
    Quote {
        text: "Discipline equals freedom.",
        author: "Jocko Willink",
    },
    Quote {
        text: "Action is the foundational key to all success.",
        author: "Pablo Picasso",
    },
    Quote {
        text: "The secret of getting ahead is getting started.",
        author: "Mark Twain",
    },
    Quote {
        text: "It’s not about having time. It’s about making time.",
        author: "Unknown",
    },
    Quote {
        text: "Don’t watch the clock; do what it does. Keep going.",
        author: "Sam Levenson",
    },
    Quote {
        text: "Routine, in an intelligent man, is a sign of ambition.",
        author: "W.H. Auden",
    },
    Quote {
        text: "It’s not that I’m so smart, it’s just that I stay with problems longer.",
        author: "Albert Einstein",
    },
    Quote {
        text: "Success doesn’t come from what you do occasionally, it comes from what you do consistently.",
        author: "Marie Forleo",
    },
    Quote {
        text: "You may delay, but time will not.",
        author: "Benjamin Franklin",
    },
    Quote {
        text: "The best way to get something done is to begin.",
        author: "Unknown",
    },
    Quote {
        text: "The only difference between success and failure is the ability to take action.",
        author: "Alexander Graham Bell",
    },
    Quote {
        text: "Your future is created by what you do today, not tomorrow.",
        author: "Robert Kiyosaki",
    },
    Quote {
        text: "The tragedy in life doesn’t lie in not reaching your goal. The tragedy lies in having no goal to reach.",
        author: "Benjamin Mays",
    },
    Quote {
        text: "Your mindset determines your success.",
        author: "Tony Robbins",
    },
    Quote {
        text: "Don’t wish it were easier. Wish you were better.",
        author: "Jim Rohn",
    },
    Quote {
        text: "Success is walking from failure to failure with no loss of enthusiasm.",
        author: "Winston Churchill",
    },
    Quote {
        text: "You don’t have to be great to start, but you have to start to be great.",
        author: "Zig Ziglar",
    },
    Quote {
        text: "The biggest room in the world is the room for improvement.",
        author: "Helmut Schmidt",
    },
    Quote {
        text: "The only place where success comes before work is in the dictionary.",
        author: "Vidal Sassoon",
    },
    Quote {
        text: "Work hard in silence; let success make the noise.",
        author: "Frank Ocean",
    },
    Quote {
        text: "Don’t count the days, make the days count.",
        author: "Muhammad Ali",
    },
    Quote {
        text: "If people knew how hard I had to work to gain my mastery, it wouldn’t seem so wonderful at all.",
        author: "Michelangelo",
    },
    Quote {
        text: "Great things are not done by impulse, but by a series of small things brought together.",
        author: "Vincent van Gogh",
    },
    Quote {
        text: "Dream big. Start small. Act now.",
        author: "Robin Sharma",
    },
    Quote {
        text: "Ideas are easy. Implementation is hard.",
        author: "Guy Kawasaki",
    },
    Quote {
        text: "Well done is better than well said.",
        author: "Benjamin Franklin",
    },
    Quote {
        text: "Execution is the chariot of genius.",
        author: "William Blake",
    },
    Quote {
        text: "If you spend too much time thinking about a thing, you’ll never get it done.",
        author: "Bruce Lee",
    },
    Quote {
        text: "I have not failed. I’ve just found 10,000 ways that won’t work.",
        author: "Thomas Edison",
    },
    Quote {
        text: "Failure is not the opposite of success; it’s part of success.",
        author: "Arianna Huffington",
    },
    Quote {
        text: "Fall seven times and stand up eight.",
        author: "Japanese Proverb",
    },
    Quote {
        text: "Success is not final, failure is not fatal: It is the courage to continue that counts.",
        author: "Winston Churchill",
    },
    Quote {
        text: "Mistakes are proof that you are trying.",
        author: "Jennifer Lim",
    },
];

/// Uniform random pick from the corpus. Repeats across calls are fine.
pub fn random_quote() -> &'static Quote {
    let index = rand::thread_rng().gen_range(0..PRODUCTIVITY_QUOTES.len());
    &PRODUCTIVITY_QUOTES[index]
}
